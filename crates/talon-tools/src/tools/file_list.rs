use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tokio::fs;

use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::sandbox::PathGuard;
use crate::tools::base::{Tool, ToolResult};

const MAX_ENTRIES: usize = 1000;

#[derive(Deserialize)]
struct FileListInput {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Clone)]
pub struct FileListTool {
    workspace_root: PathBuf,
}

impl FileListTool {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let workspace_root = workspace_root.into();
        let _ = PathGuard::new(&workspace_root)?;
        Ok(Self { workspace_root })
    }
}

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &'static str {
        "file.list"
    }

    fn description(&self) -> &'static str {
        "Lists a directory inside the workspace"
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory relative to the workspace root; defaults to the root"
                }
            }
        })
    }

    async fn execute(
        &self,
        _ctx: ExecutionContext,
        input: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let input: FileListInput =
            serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))?;

        let guard = PathGuard::new(&self.workspace_root)?;
        let validated_path = match input.path.as_deref() {
            Some(path) if !path.is_empty() => guard.validate(path)?,
            _ => guard.validate(".")?,
        };

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&validated_path)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?
        {
            if entries.len() >= MAX_ENTRIES {
                break;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            let kind = match entry.file_type().await {
                Ok(t) if t.is_dir() => "dir",
                Ok(_) => "file",
                Err(_) => "unknown",
            };
            entries.push(json!({ "name": name, "kind": kind }));
        }

        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(ToolResult {
            success: true,
            output: Some(json!({ "entries": entries })),
            error: None,
        })
    }
}
