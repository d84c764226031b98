use crate::error::EvalError;

use super::ast::{BinaryOp, BoolOp, CmpOp, Expr, Literal, Stmt, Target, UnaryOp};
use super::token::{describe, lex, Token};

// Syntax the sandbox refuses to compile at all. Function and class
// definitions would let submitted code build callables we cannot audit;
// import in any spelling would open name resolution beyond the allowlist;
// exception machinery would let code intercept the faults we rely on to
// stop it.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "import", "from", "def", "class", "lambda", "return", "yield", "del", "global", "nonlocal",
    "try", "except", "finally", "raise", "with", "assert", "async", "await",
];

/// Parses the whole source as a single expression (expression mode).
pub fn parse_expression(source: &str) -> Result<Expr, EvalError> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(EvalError::Parse("empty input".into()));
    }
    ExprParser::new(&tokens).parse_complete()
}

/// Parses the source as an indentation-structured statement sequence
/// (statement mode).
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, EvalError> {
    let lines = split_lines(source)?;
    let mut pos = 0;
    let stmts = parse_block(&lines, &mut pos, lines.first().map_or(0, |l| l.indent))?;
    if pos < lines.len() {
        return Err(EvalError::Parse(format!(
            "inconsistent indentation on line {}",
            lines[pos].number
        )));
    }
    Ok(stmts)
}

struct Line {
    indent: usize,
    tokens: Vec<Token>,
    number: usize,
}

fn split_lines(source: &str) -> Result<Vec<Line>, EvalError> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let body = raw.trim_start_matches([' ', '\t']);
        if body.is_empty() {
            continue;
        }
        let indent = raw[..raw.len() - body.len()]
            .chars()
            .map(|c| if c == '\t' { 8 } else { 1 })
            .sum();
        let tokens = lex(body)?;
        if tokens.is_empty() {
            // Comment-only line.
            continue;
        }
        lines.push(Line {
            indent,
            tokens,
            number: idx + 1,
        });
    }
    Ok(lines)
}

fn parse_block(lines: &[Line], pos: &mut usize, indent: usize) -> Result<Vec<Stmt>, EvalError> {
    let mut stmts = Vec::new();
    while *pos < lines.len() {
        let line = &lines[*pos];
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(EvalError::Parse(format!(
                "unexpected indent on line {}",
                line.number
            )));
        }
        stmts.push(parse_statement(lines, pos)?);
    }
    Ok(stmts)
}

fn parse_suite(lines: &[Line], pos: &mut usize, parent_indent: usize) -> Result<Vec<Stmt>, EvalError> {
    if *pos >= lines.len() || lines[*pos].indent <= parent_indent {
        return Err(EvalError::Parse("expected an indented block".into()));
    }
    let indent = lines[*pos].indent;
    parse_block(lines, pos, indent)
}

fn parse_statement(lines: &[Line], pos: &mut usize) -> Result<Stmt, EvalError> {
    let line = &lines[*pos];
    let indent = line.indent;
    match line.tokens.first() {
        Some(Token::If) => {
            let condition = parse_header(&line.tokens[1..], line.number)?;
            *pos += 1;
            let body = parse_suite(lines, pos, indent)?;
            let mut branches = vec![(condition, body)];
            let mut otherwise = None;
            while *pos < lines.len() && lines[*pos].indent == indent {
                match lines[*pos].tokens.first() {
                    Some(Token::Elif) => {
                        let header = &lines[*pos];
                        let condition = parse_header(&header.tokens[1..], header.number)?;
                        *pos += 1;
                        let body = parse_suite(lines, pos, indent)?;
                        branches.push((condition, body));
                    }
                    Some(Token::Else) => {
                        let header = &lines[*pos];
                        if header.tokens.len() != 2 || header.tokens[1] != Token::Colon {
                            return Err(EvalError::Parse(format!(
                                "malformed 'else' on line {}",
                                header.number
                            )));
                        }
                        *pos += 1;
                        otherwise = Some(parse_suite(lines, pos, indent)?);
                        break;
                    }
                    _ => break,
                }
            }
            Ok(Stmt::If {
                branches,
                otherwise,
            })
        }
        Some(Token::While) => {
            let condition = parse_header(&line.tokens[1..], line.number)?;
            *pos += 1;
            let body = parse_suite(lines, pos, indent)?;
            Ok(Stmt::While { condition, body })
        }
        Some(Token::For) => {
            let var = match line.tokens.get(1) {
                Some(Token::Ident(name)) => name.clone(),
                _ => {
                    return Err(EvalError::Parse(format!(
                        "expected a loop variable on line {}",
                        line.number
                    )))
                }
            };
            if !matches!(line.tokens.get(2), Some(Token::In)) {
                return Err(EvalError::Parse(format!(
                    "expected 'in' on line {}",
                    line.number
                )));
            }
            let iter = parse_header(&line.tokens[3..], line.number)?;
            *pos += 1;
            let body = parse_suite(lines, pos, indent)?;
            Ok(Stmt::For { var, iter, body })
        }
        Some(Token::Break) => {
            single_token_line(line, "break")?;
            *pos += 1;
            Ok(Stmt::Break)
        }
        Some(Token::Continue) => {
            single_token_line(line, "continue")?;
            *pos += 1;
            Ok(Stmt::Continue)
        }
        Some(Token::Pass) => {
            single_token_line(line, "pass")?;
            *pos += 1;
            Ok(Stmt::Pass)
        }
        _ => {
            let stmt = parse_simple(&line.tokens)?;
            *pos += 1;
            Ok(stmt)
        }
    }
}

fn single_token_line(line: &Line, keyword: &str) -> Result<(), EvalError> {
    if line.tokens.len() != 1 {
        return Err(EvalError::Parse(format!(
            "unexpected tokens after '{keyword}' on line {}",
            line.number
        )));
    }
    Ok(())
}

/// Header expression of a compound statement: everything before the
/// mandatory trailing ':'.
fn parse_header(tokens: &[Token], number: usize) -> Result<Expr, EvalError> {
    if !matches!(tokens.last(), Some(Token::Colon)) {
        return Err(EvalError::Parse(format!(
            "expected ':' at the end of line {number}"
        )));
    }
    ExprParser::new(&tokens[..tokens.len() - 1]).parse_complete()
}

fn parse_simple(tokens: &[Token]) -> Result<Stmt, EvalError> {
    if let Some(Token::Ident(name)) = tokens.first() {
        match tokens.get(1) {
            Some(Token::Assign) => {
                let value = ExprParser::new(&tokens[2..]).parse_complete()?;
                return Ok(Stmt::Assign {
                    target: Target::Name(name.clone()),
                    value,
                });
            }
            Some(
                op @ (Token::PlusEq | Token::MinusEq | Token::StarEq | Token::SlashEq),
            ) => {
                let op = match op {
                    Token::PlusEq => BinaryOp::Add,
                    Token::MinusEq => BinaryOp::Sub,
                    Token::StarEq => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                let value = ExprParser::new(&tokens[2..]).parse_complete()?;
                return Ok(Stmt::AugAssign {
                    name: name.clone(),
                    op,
                    value,
                });
            }
            Some(Token::LBracket) => {
                if let Some(close) = matching_bracket(tokens, 1) {
                    if matches!(tokens.get(close + 1), Some(Token::Assign)) {
                        let index = ExprParser::new(&tokens[2..close]).parse_complete()?;
                        let value = ExprParser::new(&tokens[close + 2..]).parse_complete()?;
                        return Ok(Stmt::Assign {
                            target: Target::Subscript {
                                name: name.clone(),
                                index,
                            },
                            value,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    let expr = ExprParser::new(tokens).parse_complete()?;
    Ok(Stmt::Expr(expr))
}

fn matching_bracket(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LBracket => depth += 1,
            Token::RBracket => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse_complete(&mut self) -> Result<Expr, EvalError> {
        let first = self.or_expr()?;
        let expr = if matches!(self.peek(), Some(Token::Comma)) {
            // Bare tuple: `1, 2` (with an optional trailing comma).
            let mut items = vec![first];
            while matches!(self.peek(), Some(Token::Comma)) {
                self.pos += 1;
                if self.peek().is_none() {
                    break;
                }
                items.push(self.or_expr()?);
            }
            Expr::Tuple(items)
        } else {
            first
        };
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(EvalError::Parse(format!(
                "unexpected {} after expression",
                describe(token)
            ))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, wanted: Token, what: &str) -> Result<(), EvalError> {
        match self.advance() {
            Some(token) if token == wanted => Ok(()),
            Some(other) => Err(EvalError::Parse(format!(
                "expected {what}, found {}",
                describe(&other)
            ))),
            None => Err(EvalError::Parse(format!(
                "expected {what}, found end of input"
            ))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, EvalError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(other) => Err(EvalError::Parse(format!(
                "expected a name, found {}",
                describe(&other)
            ))),
            None => Err(EvalError::Parse("expected a name, found end of input".into())),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Bool {
                op: BoolOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.not_expr()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            lhs = Expr::Bool {
                op: BoolOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.pos += 1;
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let lhs = self.arith()?;
        let op = match self.peek() {
            Some(Token::EqEq) => CmpOp::Eq,
            Some(Token::NotEq) => CmpOp::NotEq,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::LtEq) => CmpOp::LtEq,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::GtEq) => CmpOp::GtEq,
            Some(Token::In) => CmpOp::In,
            Some(Token::Not) => {
                if !matches!(self.tokens.get(self.pos + 1), Some(Token::In)) {
                    return Err(EvalError::Parse("expected 'in' after 'not'".into()));
                }
                self.pos += 1;
                CmpOp::NotIn
            }
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.arith()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn arith(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn factor(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Pos,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.factor()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.postfix()?;
        if !matches!(self.peek(), Some(Token::StarStar)) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.factor()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        })
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.atom()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.call_args()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.or_expr()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.expect_ident()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        name,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.or_expr()?);
            match self.advance() {
                Some(Token::Comma) => {
                    if matches!(self.peek(), Some(Token::RParen)) {
                        self.pos += 1;
                        return Ok(args);
                    }
                }
                Some(Token::RParen) => return Ok(args),
                Some(other) => {
                    return Err(EvalError::Parse(format!(
                        "expected ',' or ')', found {}",
                        describe(&other)
                    )))
                }
                None => return Err(EvalError::Parse("missing closing ')'".into())),
            }
        }
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Int(value)) => Ok(Expr::Literal(Literal::Int(value))),
            Some(Token::Float(value)) => Ok(Expr::Literal(Literal::Float(value))),
            Some(Token::Str(value)) => Ok(Expr::Literal(Literal::Str(value))),
            Some(Token::TrueLit) => Ok(Expr::Literal(Literal::Bool(true))),
            Some(Token::FalseLit) => Ok(Expr::Literal(Literal::Bool(false))),
            Some(Token::NoneLit) => Ok(Expr::Literal(Literal::None)),
            Some(Token::Ident(name)) => {
                if FORBIDDEN_KEYWORDS.contains(&name.as_str()) {
                    return Err(EvalError::ExecutionFault(format!(
                        "'{name}' is not allowed in the sandbox"
                    )));
                }
                Ok(Expr::Name(name))
            }
            Some(Token::LParen) => self.paren_atom(),
            Some(Token::LBracket) => self.bracket_atom(),
            Some(Token::LBrace) => self.brace_atom(),
            Some(other) => Err(EvalError::Parse(format!(
                "expected a value, found {}",
                describe(&other)
            ))),
            None => Err(EvalError::Parse("unexpected end of expression".into())),
        }
    }

    fn paren_atom(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.or_expr()?;
        if !matches!(self.peek(), Some(Token::Comma)) {
            self.expect(Token::RParen, "')'")?;
            return Ok(first);
        }
        let mut items = vec![first];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            if matches!(self.peek(), Some(Token::RParen)) {
                break;
            }
            items.push(self.or_expr()?);
        }
        self.expect(Token::RParen, "')'")?;
        Ok(Expr::Tuple(items))
    }

    fn bracket_atom(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Token::RBracket)) {
            self.pos += 1;
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.or_expr()?;
        if matches!(self.peek(), Some(Token::For)) {
            self.pos += 1;
            let var = self.expect_ident()?;
            self.expect(Token::In, "'in'")?;
            let iter = self.or_expr()?;
            let filter = if matches!(self.peek(), Some(Token::If)) {
                self.pos += 1;
                Some(Box::new(self.or_expr()?))
            } else {
                None
            };
            self.expect(Token::RBracket, "']'")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                var,
                iter: Box::new(iter),
                filter,
            });
        }
        let mut items = vec![first];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            if matches!(self.peek(), Some(Token::RBracket)) {
                break;
            }
            items.push(self.or_expr()?);
        }
        self.expect(Token::RBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn brace_atom(&mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Some(Token::RBrace)) {
            self.pos += 1;
            return Ok(Expr::Dict(Vec::new()));
        }
        let mut entries = Vec::new();
        loop {
            let key = self.or_expr()?;
            self.expect(Token::Colon, "':'")?;
            let value = self.or_expr()?;
            entries.push((key, value));
            match self.advance() {
                Some(Token::Comma) => {
                    if matches!(self.peek(), Some(Token::RBrace)) {
                        self.pos += 1;
                        return Ok(Expr::Dict(entries));
                    }
                }
                Some(Token::RBrace) => return Ok(Expr::Dict(entries)),
                Some(other) => {
                    return Err(EvalError::Parse(format!(
                        "expected ',' or '}}', found {}",
                        describe(&other)
                    )))
                }
                None => return Err(EvalError::Parse("missing closing '}'".into())),
            }
        }
    }
}
