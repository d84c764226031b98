use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use talon_interp::script;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{Tool, ToolResult};

#[derive(Deserialize)]
struct ScriptRunInput {
    code: String,
}

/// Restricted code executor. The submitted code runs against the
/// allowlisted environment in `talon_interp::script`; evaluation is
/// CPU-bound, so it is pushed onto a blocking thread and the dispatcher's
/// wall-clock timeout bounds the call.
pub struct ScriptRunTool;

#[async_trait]
impl Tool for ScriptRunTool {
    fn name(&self) -> &'static str {
        "script.run"
    }

    fn description(&self) -> &'static str {
        "Runs a short script in a sandbox. Available: abs, all, any, bool, dict, enumerate, float, int, len, list, max, min, pow, print, range, round, sum, tuple, zip, and the math module. No imports, no files, no network."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The code to run. Use print() to produce output."
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: ScriptRunInput = serde_json::from_value(input)
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let result = tokio::task::spawn_blocking(move || script::execute(&input.code))
            .await
            .map_err(|_| ToolError::Internal)??;

        Ok(ToolResult {
            success: true,
            output: Some(json!({ "result": result })),
            error: None,
        })
    }
}
