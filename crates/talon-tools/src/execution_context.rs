use serde::{Deserialize, Serialize};

/// Per-invocation context handed to every tool call. The `invocation_ref`
/// ties log lines from one dispatch together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub session_key: String,
    pub timeout_ms: u64,
    pub invocation_ref: String,
}

impl ExecutionContext {
    pub fn new(session_key: String, timeout_ms: u64) -> Self {
        Self {
            session_key,
            timeout_ms,
            invocation_ref: uuid::Uuid::new_v4().to_string(),
        }
    }
}
