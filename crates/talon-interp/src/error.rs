use thiserror::Error;

/// Failure of a single `evaluate`/`execute` invocation.
///
/// Every kind is local to one call; nothing is retried or partially
/// recovered. Messages name the offending construct and nothing else.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    #[error("unsupported name: {0}")]
    UnsupportedName(String),

    #[error("arithmetic fault: {0}")]
    RuntimeFault(String),

    #[error("execution fault: {0}")]
    ExecutionFault(String),
}
