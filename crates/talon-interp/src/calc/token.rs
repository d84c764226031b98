use logos::Logos;

use crate::error::EvalError;

/// Token set of the restricted arithmetic grammar.
///
/// Comparison, boolean, and bitwise operator spellings are lexed as
/// [`Token::Rejected`] so the parser can name them in an
/// `UnsupportedOperator` error instead of failing with an opaque parse
/// error. Any character outside this set is a parse error.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[regex(r"([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok().filter(|v| v.is_finite()))]
    Number(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("%")]
    Percent,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    #[regex(r"==|!=|<=|>=|<<|>>|//|\*\*|&&|\|\||[<>=!&|~]", |lex| lex.slice().to_owned())]
    Rejected(String),
}

pub fn lex(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(EvalError::Parse(format!(
                    "unexpected character {:?} at offset {}",
                    &source[span.clone()],
                    span.start
                )));
            }
        }
    }
    Ok(tokens)
}

pub fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => format!("number {value}"),
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Caret => "'^'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Rejected(symbol) => format!("'{symbol}'"),
    }
}
