use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use talon_interp::calc;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{Tool, ToolResult};

#[derive(Deserialize)]
struct CalculatorInput {
    expression: String,
}

/// Restricted arithmetic evaluator. Everything the expression can reach is
/// enumerated in `talon_interp::calc`; the tool itself is a thin adapter.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Evaluates an arithmetic expression. Supports + - * / ^ %, the functions abs, round, sqrt, log, log10, exp, sin, cos, tan, and the constants pi and e."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. 'sqrt(16) + 2 ^ 3'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: CalculatorInput = serde_json::from_value(input)
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        let result = calc::evaluate(&input.expression)?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({ "result": result })),
            error: None,
        })
    }
}
