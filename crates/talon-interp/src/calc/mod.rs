//! Restricted arithmetic-expression evaluator.
//!
//! The grammar is a closed set: numeric literals, `+ - * / ^ %`, unary
//! `+ -`, calls to nine math functions, and the constants `pi` and `e`.
//! There are no statements, no assignment, no attribute access, and no
//! strings; the parser fails before a tree node is built for anything else.
//!
//! The rendered result is part of the contract: integral values print with
//! no decimal point, everything else with up to ten significant digits and
//! trailing noise trimmed, because the caller parses the text.

mod ast;
mod eval;
mod parser;
mod token;

pub use ast::{BinaryOp, Expr, UnaryOp};

use crate::error::EvalError;

/// Evaluates a restricted arithmetic expression and renders the result.
pub fn evaluate(expression: &str) -> Result<String, EvalError> {
    Ok(format_number(evaluate_value(expression)?))
}

/// Evaluates to the raw numeric value. Seam for callers (and tests) that
/// want the number rather than its rendering.
pub fn evaluate_value(expression: &str) -> Result<f64, EvalError> {
    let tree = parser::parse(expression)?;
    eval::evaluate_tree(&tree)
}

const SIGNIFICANT_DIGITS: i32 = 10;

/// Renders a finite value: plain integer when there is no fractional part,
/// otherwise ten significant digits with trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        trim_exponential(&format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value))
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        trim_fixed(&format!("{value:.decimals$}"))
    }
}

fn trim_fixed(rendered: &str) -> String {
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered.to_string()
    }
}

fn trim_exponential(rendered: &str) -> String {
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            format!("{}e{exponent}", trim_fixed(mantissa))
        }
        None => rendered.to_string(),
    }
}
