use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Toolkit configuration. Everything has a working default so the registry
/// can be built without a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Root directory the file tools are confined to.
    pub workspace_root: PathBuf,
    /// Wall-clock budget the dispatcher grants each tool call.
    pub dispatch_timeout_ms: u64,
    /// Default timeout for `http.get`, seconds.
    pub http_timeout_secs: u64,
    /// Bytes of response body `http.get` returns before truncating.
    pub http_body_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            dispatch_timeout_ms: 30_000,
            http_timeout_secs: 10,
            http_body_limit: 1000,
        }
    }
}

impl ToolsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ToolError::Validation(format!("Failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| ToolError::Validation(format!("Failed to parse config: {e}")))
    }
}
