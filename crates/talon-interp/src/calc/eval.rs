use crate::error::EvalError;

use super::ast::{BinaryOp, Expr, UnaryOp};

type MathFn = fn(f64) -> f64;

/// Structural recursion over the tree. The match is exhaustive over every
/// node kind: a new `Expr` variant will not compile until it is handled
/// here, so nothing can slip past the allowlist checks by omission.
pub fn evaluate_tree(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Unary { op, operand } => {
            let value = evaluate_tree(operand)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Neg => -value,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate_tree(lhs)?;
            let rhs = evaluate_tree(rhs)?;
            apply_binary(*op, lhs, rhs)
        }
        Expr::Call { function, args } => {
            let func = function_table(function)
                .ok_or_else(|| EvalError::UnsupportedFunction(function.clone()))?;
            if args.len() != 1 {
                return Err(EvalError::RuntimeFault(format!(
                    "{function}() takes exactly one argument ({} given)",
                    args.len()
                )));
            }
            let arg = evaluate_tree(&args[0])?;
            let value = func(arg);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(EvalError::RuntimeFault(format!(
                    "{function}() is undefined for {arg}"
                )))
            }
        }
        Expr::Constant(name) => {
            constant_table(name).ok_or_else(|| EvalError::UnsupportedName(name.clone()))
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    let value = match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => {
            if rhs == 0.0 {
                return Err(EvalError::RuntimeFault("division by zero".into()));
            }
            lhs / rhs
        }
        BinaryOp::Rem => {
            if rhs == 0.0 {
                return Err(EvalError::RuntimeFault("modulo by zero".into()));
            }
            lhs % rhs
        }
        BinaryOp::Pow => lhs.powf(rhs),
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::RuntimeFault(format!(
            "{lhs} {} {rhs} has no finite value",
            op.symbol()
        )))
    }
}

fn function_table(name: &str) -> Option<MathFn> {
    fn round_half_even(x: f64) -> f64 {
        x.round_ties_even()
    }
    let func: MathFn = match name {
        "abs" => f64::abs,
        "round" => round_half_even,
        "sqrt" => f64::sqrt,
        "log" => f64::ln,
        "log10" => f64::log10,
        "exp" => f64::exp,
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        _ => return None,
    };
    Some(func)
}

fn constant_table(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}
