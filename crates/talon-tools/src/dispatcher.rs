use std::sync::Arc;

use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::registry::ToolRegistry;
use crate::tools::ToolResult;

const MAX_INPUT_BYTES: usize = 1_000_000;

/// Routes tool calls: lookup, input validation, then execution on a spawned
/// task under a wall-clock timeout. The interpreters behind the computation
/// tools impose no bound of their own, so this timeout is the only
/// execution limit in the system; a timed-out task's result is discarded.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout_ms: u64,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, timeout_ms: u64) -> Self {
        Self {
            registry,
            timeout_ms,
        }
    }

    pub async fn dispatch(
        &self,
        session_key: String,
        tool_name: String,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        info!("Dispatching tool: {} for session: {}", tool_name, session_key);

        let tool = self
            .registry
            .get(&tool_name)
            .ok_or_else(|| ToolError::Validation(format!("Tool not found: {tool_name}")))?;

        self.validate_input(&input)?;

        let ctx = ExecutionContext::new(session_key, self.timeout_ms);
        let timeout_ms = ctx.timeout_ms;

        // Spawned so a panicking tool takes down its own task, not the
        // caller.
        let handle = tokio::spawn(async move { tool.execute(ctx, input).await });

        match timeout(Duration::from_millis(timeout_ms), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!("Tool {} panicked", tool_name);
                } else {
                    error!("Tool {} was cancelled", tool_name);
                }
                Err(ToolError::Internal)
            }
            Err(_) => {
                warn!("Tool {} timed out after {}ms", tool_name, timeout_ms);
                Err(ToolError::Timeout)
            }
        }
    }

    fn validate_input(&self, input: &serde_json::Value) -> Result<(), ToolError> {
        if input.is_null() {
            return Err(ToolError::Validation("Input must not be null".into()));
        }
        if let Ok(serialized) = serde_json::to_string(input) {
            if serialized.len() > MAX_INPUT_BYTES {
                return Err(ToolError::Validation("Input too large".into()));
            }
        }
        Ok(())
    }
}
