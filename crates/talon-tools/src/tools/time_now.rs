use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{Tool, ToolResult};

const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize)]
struct TimeNowInput {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    utc: bool,
}

pub struct TimeNowTool;

#[async_trait]
impl Tool for TimeNowTool {
    fn name(&self) -> &'static str {
        "time.now"
    }

    fn description(&self) -> &'static str {
        "Returns the current time, formatted with a strftime pattern"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime pattern, e.g. %Y-%m-%d %H:%M:%S"
                },
                "utc": {"type": "boolean", "description": "Use UTC instead of local time"}
            }
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: TimeNowInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let format = input.format.as_deref().unwrap_or(DEFAULT_FORMAT);

        // A bad specifier would otherwise only surface while rendering.
        let items: Vec<Item> = StrftimeItems::new(format).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(ToolError::Validation(format!(
                "Invalid time format: {format}"
            )));
        }

        let rendered = if input.utc {
            Utc::now().format_with_items(items.into_iter()).to_string()
        } else {
            Local::now().format_with_items(items.into_iter()).to_string()
        };

        Ok(ToolResult {
            success: true,
            output: Some(json!({ "time": rendered })),
            error: None,
        })
    }
}
