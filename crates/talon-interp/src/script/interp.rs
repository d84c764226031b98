use std::collections::HashMap;

use crate::error::EvalError;

use super::ast::{BoolOp, Expr, Literal, Stmt, Target};
use super::builtins;
use super::value::{self, Value};

/// Loop control signal threaded through statement execution.
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
}

/// One invocation's worth of interpreter state: the local bindings created
/// by the executed code and the captured output. Globals are not stored
/// here at all; they are resolved through the immutable allowlist, so no
/// call can mutate them for another.
pub struct Interpreter {
    locals: HashMap<String, Value>,
    out: String,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            locals: HashMap::new(),
            out: String::new(),
        }
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn run(&mut self, stmts: &[Stmt]) -> Result<(), EvalError> {
        match self.run_block(stmts)? {
            Flow::Normal => Ok(()),
            Flow::Break => Err(EvalError::ExecutionFault("'break' outside loop".into())),
            Flow::Continue => Err(EvalError::ExecutionFault(
                "'continue' outside loop".into(),
            )),
        }
    }

    fn run_block(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.run_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn run_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                match target {
                    Target::Name(name) => {
                        self.locals.insert(name.clone(), value);
                    }
                    Target::Subscript { name, index } => {
                        let index = self.eval(index)?;
                        let slot = self.locals.get_mut(name).ok_or_else(|| {
                            EvalError::ExecutionFault(format!("name '{name}' is not defined"))
                        })?;
                        value::set_item(slot, index, value)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::AugAssign { name, op, value } => {
                let rhs = self.eval(value)?;
                let current = self.lookup(name)?;
                let updated = value::binary(*op, current, rhs)?;
                self.locals.insert(name.clone(), updated);
                Ok(Flow::Normal)
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition)?.truthy() {
                        return self.run_block(body);
                    }
                }
                if let Some(body) = otherwise {
                    return self.run_block(body);
                }
                Ok(Flow::Normal)
            }
            Stmt::While { condition, body } => {
                while self.eval(condition)?.truthy() {
                    match self.run_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For { var, iter, body } => {
                let items = self.eval(iter)?.iterate()?;
                for item in items {
                    self.locals.insert(var.clone(), item);
                    match self.run_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Pass => Ok(Flow::Normal),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.locals.get(name) {
            return Ok(value.clone());
        }
        builtins::lookup_global(name).ok_or_else(|| {
            EvalError::ExecutionFault(format!("name '{name}' is not defined"))
        })
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::None => Value::None,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => {
                let values = self.eval_all(items)?;
                Ok(Value::List(values))
            }
            Expr::Tuple(items) => {
                let values = self.eval_all(items)?;
                Ok(Value::Tuple(values))
            }
            Expr::Dict(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    values.push((self.eval(key)?, self.eval(value)?));
                }
                Ok(Value::Dict(values))
            }
            Expr::ListComp {
                element,
                var,
                iter,
                filter,
            } => {
                let items = self.eval(iter)?.iterate()?;
                let saved = self.locals.get(var).cloned();
                let mut values = Vec::new();
                let mut result = Ok(());
                for item in items {
                    self.locals.insert(var.clone(), item);
                    if let Some(filter) = filter {
                        match self.eval(filter) {
                            Ok(keep) if !keep.truthy() => continue,
                            Ok(_) => {}
                            Err(err) => {
                                result = Err(err);
                                break;
                            }
                        }
                    }
                    match self.eval(element) {
                        Ok(value) => values.push(value),
                        Err(err) => {
                            result = Err(err);
                            break;
                        }
                    }
                }
                // The loop variable does not leak out of the comprehension.
                match saved {
                    Some(value) => {
                        self.locals.insert(var.clone(), value);
                    }
                    None => {
                        self.locals.remove(var);
                    }
                }
                result.map(|()| Value::List(values))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                value::unary(*op, operand)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                value::binary(*op, lhs, rhs)
            }
            Expr::Bool { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                match op {
                    BoolOp::And if !lhs.truthy() => Ok(lhs),
                    BoolOp::Or if lhs.truthy() => Ok(lhs),
                    _ => self.eval(rhs),
                }
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                value::compare(*op, &lhs, &rhs).map(Value::Bool)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = self.eval_all(args)?;
                match callee {
                    Value::Builtin(builtin) => {
                        builtins::call_builtin(builtin, args, &mut self.out)
                    }
                    Value::MathFunc(func) => builtins::call_math(func, args),
                    other => Err(EvalError::ExecutionFault(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Expr::Attribute { value, name } => {
                let value = self.eval(value)?;
                match value {
                    Value::MathModule => builtins::math_member(name).ok_or_else(|| {
                        EvalError::ExecutionFault(format!(
                            "module 'math' has no attribute '{name}'"
                        ))
                    }),
                    other => Err(EvalError::ExecutionFault(format!(
                        "attribute access is not allowed on '{}' values",
                        other.type_name()
                    ))),
                }
            }
            Expr::Subscript { value, index } => {
                let value = self.eval(value)?;
                let index = self.eval(index)?;
                value::get_item(&value, &index)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval(expr)?);
        }
        Ok(values)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
