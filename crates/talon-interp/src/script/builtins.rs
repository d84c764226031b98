use crate::error::EvalError;

use super::ast::BinaryOp;
use super::value::{self, Value};

/// The builtin allowlist: the only callables submitted code can reach by
/// bare name. Nothing here can touch the filesystem, the network, a
/// process, or host program state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    All,
    Any,
    Bool,
    Dict,
    Enumerate,
    Float,
    Int,
    Len,
    List,
    Max,
    Min,
    Pow,
    Print,
    Range,
    Round,
    Sum,
    Tuple,
    Zip,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "abs" => Builtin::Abs,
            "all" => Builtin::All,
            "any" => Builtin::Any,
            "bool" => Builtin::Bool,
            "dict" => Builtin::Dict,
            "enumerate" => Builtin::Enumerate,
            "float" => Builtin::Float,
            "int" => Builtin::Int,
            "len" => Builtin::Len,
            "list" => Builtin::List,
            "max" => Builtin::Max,
            "min" => Builtin::Min,
            "pow" => Builtin::Pow,
            "print" => Builtin::Print,
            "range" => Builtin::Range,
            "round" => Builtin::Round,
            "sum" => Builtin::Sum,
            "tuple" => Builtin::Tuple,
            "zip" => Builtin::Zip,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::All => "all",
            Builtin::Any => "any",
            Builtin::Bool => "bool",
            Builtin::Dict => "dict",
            Builtin::Enumerate => "enumerate",
            Builtin::Float => "float",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::List => "list",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::Pow => "pow",
            Builtin::Print => "print",
            Builtin::Range => "range",
            Builtin::Round => "round",
            Builtin::Sum => "sum",
            Builtin::Tuple => "tuple",
            Builtin::Zip => "zip",
        }
    }
}

/// Members of the one safe module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunc {
    Sqrt,
    Log,
    Log10,
    Exp,
    Sin,
    Cos,
    Tan,
    Floor,
    Ceil,
    Fabs,
    Pow,
}

impl MathFunc {
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => MathFunc::Sqrt,
            "log" => MathFunc::Log,
            "log10" => MathFunc::Log10,
            "exp" => MathFunc::Exp,
            "sin" => MathFunc::Sin,
            "cos" => MathFunc::Cos,
            "tan" => MathFunc::Tan,
            "floor" => MathFunc::Floor,
            "ceil" => MathFunc::Ceil,
            "fabs" => MathFunc::Fabs,
            "pow" => MathFunc::Pow,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            MathFunc::Sqrt => "sqrt",
            MathFunc::Log => "log",
            MathFunc::Log10 => "log10",
            MathFunc::Exp => "exp",
            MathFunc::Sin => "sin",
            MathFunc::Cos => "cos",
            MathFunc::Tan => "tan",
            MathFunc::Floor => "floor",
            MathFunc::Ceil => "ceil",
            MathFunc::Fabs => "fabs",
            MathFunc::Pow => "pow",
        }
    }
}

/// Resolves a bare name against the immutable global namespace.
pub(crate) fn lookup_global(name: &str) -> Option<Value> {
    if name == "math" {
        return Some(Value::MathModule);
    }
    Builtin::lookup(name).map(Value::Builtin)
}

/// Resolves `math.<name>`.
pub(crate) fn math_member(name: &str) -> Option<Value> {
    match name {
        "pi" => return Some(Value::Float(std::f64::consts::PI)),
        "e" => return Some(Value::Float(std::f64::consts::E)),
        "tau" => return Some(Value::Float(std::f64::consts::TAU)),
        _ => {}
    }
    MathFunc::lookup(name).map(Value::MathFunc)
}

fn arity(name: &str, expected: &str, given: usize) -> EvalError {
    EvalError::ExecutionFault(format!(
        "{name}() takes {expected} ({given} given)"
    ))
}

fn expect_int(name: &str, value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(EvalError::ExecutionFault(format!(
            "'{}' object cannot be interpreted as an integer in {name}()",
            other.type_name()
        ))),
    }
}

fn expect_float(name: &str, value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        other => Err(EvalError::ExecutionFault(format!(
            "{name}() requires a real number, not '{}'",
            other.type_name()
        ))),
    }
}

pub(crate) fn call_builtin(
    builtin: Builtin,
    args: Vec<Value>,
    out: &mut String,
) -> Result<Value, EvalError> {
    let name = builtin.name();
    match builtin {
        Builtin::Print => {
            let rendered: Vec<String> = args.iter().map(Value::display).collect();
            out.push_str(&rendered.join(" "));
            out.push('\n');
            Ok(Value::None)
        }
        Builtin::Abs => {
            let [value] = one(name, args)?;
            match value {
                Value::Int(i) => i.checked_abs().map(Value::Int).ok_or_else(|| {
                    EvalError::RuntimeFault("integer overflow in abs()".into())
                }),
                Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(EvalError::ExecutionFault(format!(
                    "bad operand type for abs(): '{}'",
                    other.type_name()
                ))),
            }
        }
        Builtin::All => {
            let [value] = one(name, args)?;
            Ok(Value::Bool(value.iterate()?.iter().all(Value::truthy)))
        }
        Builtin::Any => {
            let [value] = one(name, args)?;
            Ok(Value::Bool(value.iterate()?.iter().any(Value::truthy)))
        }
        Builtin::Bool => match args.len() {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(args[0].truthy())),
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Dict => match args.len() {
            0 => Ok(Value::Dict(Vec::new())),
            1 => dict_from(&args[0]),
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Enumerate => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity(name, "one or two arguments", args.len()));
            }
            let start = match args.get(1) {
                Some(value) => expect_int(name, value)?,
                None => 0,
            };
            let items = args[0].iterate()?;
            Ok(Value::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| Value::Tuple(vec![Value::Int(start + i as i64), item]))
                    .collect(),
            ))
        }
        Builtin::Float => match args.len() {
            0 => Ok(Value::Float(0.0)),
            1 => match &args[0] {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    EvalError::ExecutionFault(format!(
                        "could not convert string to float: {}",
                        Value::Str(s.clone()).repr()
                    ))
                }),
                other => Err(EvalError::ExecutionFault(format!(
                    "float() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            },
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Int => match args.len() {
            0 => Ok(Value::Int(0)),
            1 => match &args[0] {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Float(f) => {
                    let truncated = f.trunc();
                    if !truncated.is_finite() || truncated.abs() >= i64::MAX as f64 {
                        return Err(EvalError::RuntimeFault(
                            "float value out of integer range".into(),
                        ));
                    }
                    Ok(Value::Int(truncated as i64))
                }
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    EvalError::ExecutionFault(format!(
                        "invalid literal for int(): {}",
                        Value::Str(s.clone()).repr()
                    ))
                }),
                other => Err(EvalError::ExecutionFault(format!(
                    "int() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            },
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Len => {
            let [value] = one(name, args)?;
            let len = match &value {
                Value::Str(s) => s.chars().count() as i64,
                Value::List(items) | Value::Tuple(items) => items.len() as i64,
                Value::Dict(entries) => entries.len() as i64,
                Value::Range { start, stop, step } => value::range_len(*start, *stop, *step),
                other => {
                    return Err(EvalError::ExecutionFault(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Int(len))
        }
        Builtin::List => match args.len() {
            0 => Ok(Value::List(Vec::new())),
            1 => Ok(Value::List(args[0].iterate()?)),
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Max => extremum(name, args, std::cmp::Ordering::Greater),
        Builtin::Min => extremum(name, args, std::cmp::Ordering::Less),
        Builtin::Pow => {
            if args.len() != 2 {
                return Err(arity(name, "exactly two arguments", args.len()));
            }
            let mut args = args;
            let rhs = args.pop().unwrap_or(Value::None);
            let lhs = args.pop().unwrap_or(Value::None);
            value::binary(BinaryOp::Pow, lhs, rhs)
        }
        Builtin::Range => {
            let (start, stop, step) = match args.len() {
                1 => (0, expect_int(name, &args[0])?, 1),
                2 => (expect_int(name, &args[0])?, expect_int(name, &args[1])?, 1),
                3 => (
                    expect_int(name, &args[0])?,
                    expect_int(name, &args[1])?,
                    expect_int(name, &args[2])?,
                ),
                n => return Err(arity(name, "one to three arguments", n)),
            };
            if step == 0 {
                return Err(EvalError::ExecutionFault(
                    "range() arg 3 must not be zero".into(),
                ));
            }
            Ok(Value::Range { start, stop, step })
        }
        Builtin::Round => round(args),
        Builtin::Sum => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity(name, "one or two arguments", args.len()));
            }
            let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
            for item in args[0].iterate()? {
                total = value::binary(BinaryOp::Add, total, item)?;
            }
            Ok(total)
        }
        Builtin::Tuple => match args.len() {
            0 => Ok(Value::Tuple(Vec::new())),
            1 => Ok(Value::Tuple(args[0].iterate()?)),
            n => Err(arity(name, "at most one argument", n)),
        },
        Builtin::Zip => {
            let mut columns = Vec::with_capacity(args.len());
            for arg in &args {
                columns.push(arg.iterate()?);
            }
            let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
            let mut rows = Vec::with_capacity(shortest);
            for i in 0..shortest {
                rows.push(Value::Tuple(
                    columns.iter().map(|col| col[i].clone()).collect(),
                ));
            }
            Ok(Value::List(rows))
        }
    }
}

fn one(name: &str, args: Vec<Value>) -> Result<[Value; 1], EvalError> {
    let len = args.len();
    <[Value; 1]>::try_from(args).map_err(|_| arity(name, "exactly one argument", len))
}

fn dict_from(source: &Value) -> Result<Value, EvalError> {
    if let Value::Dict(entries) = source {
        return Ok(Value::Dict(entries.clone()));
    }
    let mut entries: Vec<(Value, Value)> = Vec::new();
    for item in source.iterate()? {
        let pair = match item {
            Value::List(p) | Value::Tuple(p) if p.len() == 2 => p,
            other => {
                return Err(EvalError::ExecutionFault(format!(
                    "dict() requires an iterable of key/value pairs, got '{}'",
                    other.type_name()
                )))
            }
        };
        let mut pair = pair.into_iter();
        let key = pair.next().unwrap_or(Value::None);
        let val = pair.next().unwrap_or(Value::None);
        match entries.iter_mut().find(|(k, _)| value::values_equal(k, &key)) {
            Some((_, existing)) => *existing = val,
            None => entries.push((key, val)),
        }
    }
    Ok(Value::Dict(entries))
}

fn extremum(
    name: &str,
    args: Vec<Value>,
    wanted: std::cmp::Ordering,
) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(arity(name, "at least one argument", 0));
    }
    let items = if args.len() == 1 {
        args[0].iterate()?
    } else {
        args
    };
    let mut items = items.into_iter();
    let mut best = items.next().ok_or_else(|| {
        EvalError::ExecutionFault(format!("{name}() arg is an empty sequence"))
    })?;
    for item in items {
        if value::try_ordering(&item, &best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn round(args: Vec<Value>) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(arity("round", "one or two arguments", args.len()));
    }
    let ndigits = match args.get(1) {
        Some(value) => Some(expect_int("round", value)?),
        None => None,
    };
    match (&args[0], ndigits) {
        (Value::Int(i), _) => Ok(Value::Int(*i)),
        (Value::Bool(b), _) => Ok(Value::Int(i64::from(*b))),
        (Value::Float(f), None) => {
            if !f.is_finite() {
                return Err(EvalError::RuntimeFault(
                    "cannot round a non-finite float to an integer".into(),
                ));
            }
            let rounded = f.round_ties_even();
            if rounded.abs() >= i64::MAX as f64 {
                return Err(EvalError::RuntimeFault(
                    "rounded value out of integer range".into(),
                ));
            }
            Ok(Value::Int(rounded as i64))
        }
        (Value::Float(f), Some(n)) => {
            if !f.is_finite() {
                return Ok(Value::Float(*f));
            }
            let factor = 10f64.powi(n.clamp(-308, 308) as i32);
            Ok(Value::Float((f * factor).round_ties_even() / factor))
        }
        (other, _) => Err(EvalError::ExecutionFault(format!(
            "type '{}' cannot be rounded",
            other.type_name()
        ))),
    }
}

pub(crate) fn call_math(func: MathFunc, args: Vec<Value>) -> Result<Value, EvalError> {
    let name = func.name();
    match func {
        MathFunc::Pow => {
            if args.len() != 2 {
                return Err(arity("math.pow", "exactly two arguments", args.len()));
            }
            let base = expect_float(name, &args[0])?;
            let exp = expect_float(name, &args[1])?;
            finite(name, base.powf(exp))
        }
        MathFunc::Log => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity("math.log", "one or two arguments", args.len()));
            }
            let x = expect_float(name, &args[0])?;
            let value = match args.get(1) {
                Some(base) => x.log(expect_float(name, base)?),
                None => x.ln(),
            };
            finite(name, value)
        }
        MathFunc::Floor | MathFunc::Ceil => {
            let [value] = one(name, args)?;
            let x = expect_float(name, &value)?;
            let rounded = if func == MathFunc::Floor {
                x.floor()
            } else {
                x.ceil()
            };
            if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
                return Err(EvalError::RuntimeFault(format!(
                    "math.{name}() result out of integer range"
                )));
            }
            Ok(Value::Int(rounded as i64))
        }
        MathFunc::Fabs => {
            let [value] = one(name, args)?;
            Ok(Value::Float(expect_float(name, &value)?.abs()))
        }
        MathFunc::Sqrt | MathFunc::Log10 | MathFunc::Exp | MathFunc::Sin | MathFunc::Cos
        | MathFunc::Tan => {
            let [value] = one(name, args)?;
            let x = expect_float(name, &value)?;
            let result = match func {
                MathFunc::Sqrt => x.sqrt(),
                MathFunc::Log10 => x.log10(),
                MathFunc::Exp => x.exp(),
                MathFunc::Sin => x.sin(),
                MathFunc::Cos => x.cos(),
                _ => x.tan(),
            };
            finite(name, result)
        }
    }
}

fn finite(name: &str, value: f64) -> Result<Value, EvalError> {
    if value.is_finite() {
        Ok(Value::Float(value))
    } else {
        Err(EvalError::RuntimeFault(format!(
            "math domain error in math.{name}()"
        )))
    }
}
