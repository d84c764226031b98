use crate::error::EvalError;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::token::{describe, lex, Token};

/// Parses `source` into an expression tree, or fails before any node is
/// built. Everything outside the restricted grammar is rejected here;
/// evaluation never sees it.
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(EvalError::Parse("empty expression".into()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
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

    fn expect_end(&mut self) -> Result<(), EvalError> {
        match self.advance() {
            None => Ok(()),
            Some(Token::Rejected(symbol)) => Err(EvalError::UnsupportedOperator(symbol)),
            Some(other) => Err(EvalError::Parse(format!(
                "unexpected {} after expression",
                describe(&other)
            ))),
        }
    }

    fn match_additive(&mut self) -> Option<BinaryOp> {
        let op = match self.peek()? {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn match_multiplicative(&mut self) -> Option<BinaryOp> {
        let op = match self.peek()? {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.match_additive() {
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.match_multiplicative() {
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    // Right-associative; the exponent may itself be signed, so `-2^2` is
    // `-(2^2)` and `2^-3` parses.
    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.atom()?;
        if !matches!(self.peek(), Some(Token::Caret)) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.unary()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        })
    }

    fn atom(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        function: name,
                        args,
                    })
                } else {
                    Ok(Expr::Constant(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(Token::Rejected(symbol)) => Err(EvalError::UnsupportedOperator(symbol)),
                    Some(other) => Err(EvalError::Parse(format!(
                        "expected ')', found {}",
                        describe(&other)
                    ))),
                    None => Err(EvalError::Parse("missing closing ')'".into())),
                }
            }
            Some(Token::Rejected(symbol)) => Err(EvalError::UnsupportedOperator(symbol)),
            Some(other) => Err(EvalError::Parse(format!(
                "expected a value, found {}",
                describe(&other)
            ))),
            None => Err(EvalError::Parse("unexpected end of expression".into())),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(Token::Rejected(symbol)) => {
                    return Err(EvalError::UnsupportedOperator(symbol))
                }
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
}
