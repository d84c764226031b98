use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tokio::fs;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::sandbox::PathGuard;
use crate::tools::base::{Tool, ToolResult};

#[derive(Deserialize)]
struct FileReadInput {
    path: String,
}

#[derive(Clone)]
pub struct FileReadTool {
    workspace_root: PathBuf,
}

impl FileReadTool {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let workspace_root = workspace_root.into();
        // Validate the root up front so a bad configuration fails at
        // construction, not on first use.
        let _ = PathGuard::new(&workspace_root)?;
        Ok(Self { workspace_root })
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &'static str {
        "file.read"
    }

    fn description(&self) -> &'static str {
        "Reads a text file inside the workspace"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path relative to the workspace root"}
            },
            "required": ["path"]
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: FileReadInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let guard = PathGuard::new(&self.workspace_root)?;
        let validated_path = guard.validate(&input.path)?;

        let content = fs::read_to_string(&validated_path)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        Ok(ToolResult {
            success: true,
            output: Some(json!({ "content": content })),
            error: None,
        })
    }
}
