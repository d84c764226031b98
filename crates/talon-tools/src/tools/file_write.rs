use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::sandbox::PathGuard;
use crate::tools::base::{Tool, ToolResult};

#[derive(Deserialize)]
struct FileWriteInput {
    path: String,
    content: String,
    #[serde(default)]
    append: bool,
}

#[derive(Clone)]
pub struct FileWriteTool {
    workspace_root: PathBuf,
}

impl FileWriteTool {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let workspace_root = workspace_root.into();
        let _ = PathGuard::new(&workspace_root)?;
        Ok(Self { workspace_root })
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &'static str {
        "file.write"
    }

    fn description(&self) -> &'static str {
        "Writes or appends a text file inside the workspace"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path relative to the workspace root"},
                "content": {"type": "string"},
                "append": {"type": "boolean", "description": "Append instead of replacing"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: FileWriteInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let guard = PathGuard::new(&self.workspace_root)?;
        let validated_path = guard.validate_new(&input.path)?;

        if let Some(parent) = validated_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
        }

        if input.append {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&validated_path)
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            file.write_all(input.content.as_bytes())
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            file.sync_all()
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
        } else {
            // Write-then-rename so a failed write never leaves a half
            // replaced file.
            let temp_path = validated_path.with_extension("tmp");
            let mut file = fs::File::create(&temp_path)
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            file.write_all(input.content.as_bytes())
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            file.sync_all()
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
            fs::rename(&temp_path, &validated_path)
                .await
                .map_err(|e| ToolError::Execution(e.to_string()))?;
        }

        Ok(ToolResult {
            success: true,
            output: Some(json!({
                "path": input.path,
                "bytes_written": input.content.len()
            })),
            error: None,
        })
    }
}
