use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::tools::{
    CalculatorTool, FileListTool, FileReadTool, FileWriteTool, HttpGetTool, ScriptRunTool,
    TimeNowTool, Tool,
};

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Declarations in the shape the model-facing API expects.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.schema()
                    }
                })
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the full toolkit against one configuration.
pub fn standard_registry(config: &ToolsConfig) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(CalculatorTool))
        .register(Arc::new(ScriptRunTool))
        .register(Arc::new(FileReadTool::new(&config.workspace_root)?))
        .register(Arc::new(FileWriteTool::new(&config.workspace_root)?))
        .register(Arc::new(FileListTool::new(&config.workspace_root)?))
        .register(Arc::new(HttpGetTool::new(config)))
        .register(Arc::new(TimeNowTool));
    Ok(registry)
}
