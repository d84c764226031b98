use talon_interp::EvalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Sandbox violation: {0}")]
    SandboxViolation(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Internal error")]
    Internal,
}

impl From<EvalError> for ToolError {
    fn from(err: EvalError) -> Self {
        ToolError::Execution(err.to_string())
    }
}
