use std::cmp::Ordering;

use crate::error::EvalError;

use super::ast::{BinaryOp, CmpOp, UnaryOp};
use super::builtins::{Builtin, MathFunc};

// Materializing a range allocates; past this point the allocation itself is
// the attack, so the call is refused.
const MAX_RANGE_ITEMS: i64 = 10_000_000;

/// Runtime value of the restricted script language.
///
/// Booleans participate in arithmetic as 0/1, `/` is always float division,
/// `//` and `%` follow floor semantics, and integers are checked 64-bit
/// (overflow is a fault, not a wrap).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Range { start: i64, stop: i64, step: i64 },
    Builtin(Builtin),
    MathFunc(MathFunc),
    MathModule,
}

enum Num {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
            Value::Builtin(_) | Value::MathFunc(_) => "builtin_function",
            Value::MathModule => "module",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Range { start, stop, step } => range_len(*start, *stop, *step) > 0,
            Value::Builtin(_) | Value::MathFunc(_) | Value::MathModule => true,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote_str(s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                if items.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            Value::Dict(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Range { start, stop, step } => {
                if *step == 1 {
                    format!("range({start}, {stop})")
                } else {
                    format!("range({start}, {stop}, {step})")
                }
            }
            Value::Builtin(builtin) => format!("<built-in function {}>", builtin.name()),
            Value::MathFunc(func) => format!("<built-in function {}>", func.name()),
            Value::MathModule => "<module 'math'>".to_string(),
        }
    }

    /// `str()` rendering, used by `print`: strings are raw, everything else
    /// is its repr.
    pub fn display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.repr(),
        }
    }

    pub fn iterate(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
            Value::Range { start, stop, step } => {
                let len = range_len(*start, *stop, *step);
                if len > MAX_RANGE_ITEMS {
                    return Err(EvalError::ExecutionFault(format!(
                        "range of {len} items is too large for the sandbox"
                    )));
                }
                let mut items = Vec::with_capacity(len as usize);
                let mut current = i128::from(*start);
                for _ in 0..len {
                    items.push(Value::Int(current as i64));
                    current += i128::from(*step);
                }
                Ok(items)
            }
            other => Err(EvalError::ExecutionFault(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }
}

pub(crate) fn range_len(start: i64, stop: i64, step: i64) -> i64 {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let len = if step > 0 {
        if stop > start {
            (stop - start + step - 1) / step
        } else {
            0
        }
    } else if stop < start {
        (start - stop - step - 1) / -step
    } else {
        0
    };
    len.min(i128::from(i64::MAX)) as i64
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn quote_str(s: &str) -> String {
    // Single quotes, switching to double quotes when that avoids escaping,
    // matching the host language's repr.
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn type_fault(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::ExecutionFault(format!(
        "unsupported operand types for {op}: '{}' and '{}'",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn overflow(op: &str) -> EvalError {
    EvalError::RuntimeFault(format!("integer overflow in {op}"))
}

pub(crate) fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.truthy())),
        UnaryOp::Neg => match as_number(&operand) {
            Some(Num::Int(i)) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| overflow("-")),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(EvalError::ExecutionFault(format!(
                "bad operand type for unary -: '{}'",
                operand.type_name()
            ))),
        },
        UnaryOp::Pos => match as_number(&operand) {
            Some(Num::Int(i)) => Ok(Value::Int(i)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(EvalError::ExecutionFault(format!(
                "bad operand type for unary +: '{}'",
                operand.type_name()
            ))),
        },
    }
}

pub(crate) fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    // Sequence forms of + and * come first; everything left over must be
    // numeric.
    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            return Ok(Value::Str(format!("{a}{b}")));
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            return Ok(Value::List(items));
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            return Ok(Value::Tuple(items));
        }
        (BinaryOp::Mul, _, _) => {
            if let Some(value) = try_repeat(&lhs, &rhs)? {
                return Ok(value);
            }
        }
        _ => {}
    }
    let (a, b) = match (as_number(&lhs), as_number(&rhs)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(type_fault(op.symbol(), &lhs, &rhs)),
    };
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => int_binary(op, a, b),
        (Num::Int(a), Num::Float(b)) => float_binary(op, a as f64, b),
        (Num::Float(a), Num::Int(b)) => float_binary(op, a, b as f64),
        (Num::Float(a), Num::Float(b)) => float_binary(op, a, b),
    }
}

fn try_repeat(lhs: &Value, rhs: &Value) -> Result<Option<Value>, EvalError> {
    let (seq, count) = match (lhs, rhs) {
        (seq @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)), count)
        | (count, seq @ (Value::Str(_) | Value::List(_) | Value::Tuple(_))) => {
            match as_number(count) {
                Some(Num::Int(n)) => (seq, n),
                _ => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    let count = count.max(0) as usize;
    let repeated = match seq {
        Value::Str(s) => {
            if s.len().saturating_mul(count) > 100_000_000 {
                return Err(EvalError::ExecutionFault(
                    "repeated string is too large for the sandbox".into(),
                ));
            }
            Value::Str(s.repeat(count))
        }
        Value::List(items) => Value::List(repeat_items(items, count)?),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, count)?),
        _ => return Ok(None),
    };
    Ok(Some(repeated))
}

fn repeat_items(items: &[Value], count: usize) -> Result<Vec<Value>, EvalError> {
    if items.len().saturating_mul(count) > 10_000_000 {
        return Err(EvalError::ExecutionFault(
            "repeated sequence is too large for the sandbox".into(),
        ));
    }
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    Ok(out)
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("+")),
        BinaryOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow("-")),
        BinaryOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow("*")),
        BinaryOp::Div => {
            if b == 0 {
                Err(EvalError::RuntimeFault("division by zero".into()))
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                Err(EvalError::RuntimeFault("division by zero".into()))
            } else if a == i64::MIN && b == -1 {
                Err(overflow("//"))
            } else {
                Ok(Value::Int(floor_div(a, b)))
            }
        }
        BinaryOp::Rem => {
            if b == 0 {
                Err(EvalError::RuntimeFault("modulo by zero".into()))
            } else if a == i64::MIN && b == -1 {
                Ok(Value::Int(0))
            } else {
                Ok(Value::Int(floor_mod(a, b)))
            }
        }
        BinaryOp::Pow => {
            if b >= 0 {
                let exponent =
                    u32::try_from(b).map_err(|_| overflow("**"))?;
                a.checked_pow(exponent)
                    .map(Value::Int)
                    .ok_or_else(|| overflow("**"))
            } else if a == 0 {
                Err(EvalError::RuntimeFault(
                    "zero cannot be raised to a negative power".into(),
                ))
            } else {
                // |a| >= 1 here, so a negative exponent cannot overflow.
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }
    }
}

// Quotient and remainder that round toward negative infinity, with the
// remainder taking the divisor's sign.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::RuntimeFault("float division by zero".into()));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::RuntimeFault("float division by zero".into()));
            }
            (a / b).floor()
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                return Err(EvalError::RuntimeFault("float modulo by zero".into()));
            }
            a - b * (a / b).floor()
        }
        BinaryOp::Pow => a.powf(b),
    };
    if !value.is_finite() && a.is_finite() && b.is_finite() {
        return Err(EvalError::RuntimeFault(format!(
            "no finite result for {} {} {}",
            format_float(a),
            op.symbol(),
            format_float(b)
        )));
    }
    Ok(Value::Float(value))
}

pub(crate) fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(values_equal(lhs, rhs)),
        CmpOp::NotEq => Ok(!values_equal(lhs, rhs)),
        CmpOp::In => contains(rhs, lhs),
        CmpOp::NotIn => contains(rhs, lhs).map(|found| !found),
        ordered => {
            if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
                return Ok(match (a, b) {
                    (Num::Int(a), Num::Int(b)) => ordering_matches(ordered, a.cmp(&b)),
                    (a, b) => float_compare(ordered, num_to_f64(a), num_to_f64(b)),
                });
            }
            match (lhs, rhs) {
                (Value::Str(a), Value::Str(b)) => Ok(ordering_matches(ordered, a.cmp(b))),
                (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                    seq_ordering(a, b).map(|o| ordering_matches(ordered, o))
                }
                _ => Err(EvalError::ExecutionFault(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    ordered.symbol(),
                    lhs.type_name(),
                    rhs.type_name()
                ))),
            }
        }
    }
}

fn num_to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

// NaN compares false against everything, as in the host language.
fn float_compare(op: CmpOp, a: f64, b: f64) -> bool {
    match op {
        CmpOp::Lt => a < b,
        CmpOp::LtEq => a <= b,
        CmpOp::Gt => a > b,
        CmpOp::GtEq => a >= b,
        _ => false,
    }
}

fn ordering_matches(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::LtEq => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

pub(crate) fn try_ordering(lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        if let (Num::Int(a), Num::Int(b)) = (&a, &b) {
            return Ok(a.cmp(b));
        }
        return num_to_f64(a)
            .partial_cmp(&num_to_f64(b))
            .ok_or_else(|| EvalError::ExecutionFault("nan has no ordering".into()));
    }
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            seq_ordering(a, b)
        }
        _ => Err(EvalError::ExecutionFault(format!(
            "'{}' and '{}' cannot be ordered",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn seq_ordering(a: &[Value], b: &[Value]) -> Result<Ordering, EvalError> {
    for (x, y) in a.iter().zip(b.iter()) {
        if !values_equal(x, y) {
            return try_ordering(x, y);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

pub(crate) fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        return match (a, b) {
            (Num::Int(a), Num::Int(b)) => a == b,
            (a, b) => num_to_f64(a) == num_to_f64(b),
        };
    }
    match (lhs, rhs) {
        (Value::None, Value::None) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Dict(a), Value::Dict(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| {
                    b.iter()
                        .any(|(bk, bv)| values_equal(k, bk) && values_equal(v, bv))
                })
        }
        (
            Value::Range {
                start: a1,
                stop: a2,
                step: a3,
            },
            Value::Range {
                start: b1,
                stop: b2,
                step: b3,
            },
        ) => a1 == b1 && a2 == b2 && a3 == b3,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        (Value::MathFunc(a), Value::MathFunc(b)) => a == b,
        (Value::MathModule, Value::MathModule) => true,
        _ => false,
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) | Value::Tuple(items) => {
            Ok(items.iter().any(|i| values_equal(i, item)))
        }
        Value::Dict(entries) => Ok(entries.iter().any(|(k, _)| values_equal(k, item))),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::ExecutionFault(format!(
                "'in <string>' requires string as left operand, not '{}'",
                other.type_name()
            ))),
        },
        Value::Range { start, stop, step } => match item {
            Value::Int(v) => {
                let in_span = if *step > 0 {
                    v >= start && v < stop
                } else {
                    v <= start && v > stop
                };
                Ok(in_span && (v - start) % step == 0)
            }
            _ => Ok(false),
        },
        other => Err(EvalError::ExecutionFault(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

pub(crate) fn get_item(value: &Value, index: &Value) -> Result<Value, EvalError> {
    match value {
        Value::List(items) => indexed(items, index, "list").cloned(),
        Value::Tuple(items) => indexed(items, index, "tuple").cloned(),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(index, chars.len(), "string")?;
            Ok(Value::Str(chars[idx].to_string()))
        }
        Value::Dict(entries) => entries
            .iter()
            .find(|(k, _)| values_equal(k, index))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| {
                EvalError::ExecutionFault(format!("key not found: {}", index.repr()))
            }),
        other => Err(EvalError::ExecutionFault(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

pub(crate) fn set_item(slot: &mut Value, index: Value, new_value: Value) -> Result<(), EvalError> {
    match slot {
        Value::List(items) => {
            let idx = normalize_index(&index, items.len(), "list")?;
            items[idx] = new_value;
            Ok(())
        }
        Value::Dict(entries) => {
            for (k, v) in entries.iter_mut() {
                if values_equal(k, &index) {
                    *v = new_value;
                    return Ok(());
                }
            }
            entries.push((index, new_value));
            Ok(())
        }
        other => Err(EvalError::ExecutionFault(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

fn indexed<'a>(items: &'a [Value], index: &Value, what: &str) -> Result<&'a Value, EvalError> {
    let idx = normalize_index(index, items.len(), what)?;
    Ok(&items[idx])
}

fn normalize_index(index: &Value, len: usize, what: &str) -> Result<usize, EvalError> {
    let raw = match as_number(index) {
        Some(Num::Int(i)) => i,
        _ => {
            return Err(EvalError::ExecutionFault(format!(
                "{what} indices must be integers, not '{}'",
                index.type_name()
            )))
        }
    };
    let len = len as i64;
    let idx = if raw < 0 { raw + len } else { raw };
    if idx < 0 || idx >= len {
        return Err(EvalError::ExecutionFault(format!(
            "{what} index out of range"
        )));
    }
    Ok(idx as usize)
}
