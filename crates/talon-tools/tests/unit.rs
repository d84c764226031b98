#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use talon_tools::sandbox::PathGuard;
    use talon_tools::tools::*;
    use talon_tools::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("test_session".into(), 5000)
    }

    #[tokio::test]
    async fn test_calculator_tool() {
        let tool = CalculatorTool;
        let input = json!({"expression": "3 + 4 * 2"});

        let result = tool.execute(ctx(), input).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output.unwrap()["result"], "11");
    }

    #[tokio::test]
    async fn test_calculator_tool_formatting() {
        let tool = CalculatorTool;
        let result = tool
            .execute(ctx(), json!({"expression": "pi"}))
            .await
            .unwrap();
        assert_eq!(result.output.unwrap()["result"], "3.141592654");
    }

    #[tokio::test]
    async fn test_calculator_tool_rejects_bad_expression() {
        let tool = CalculatorTool;
        let result = tool
            .execute(ctx(), json!({"expression": "launch()"}))
            .await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_calculator_tool_rejects_missing_field() {
        let tool = CalculatorTool;
        let result = tool.execute(ctx(), json!({})).await;
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[tokio::test]
    async fn test_script_tool_print() {
        let tool = ScriptRunTool;
        let result = tool
            .execute(ctx(), json!({"code": "print(1+1)"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output.unwrap()["result"], "2");
    }

    #[tokio::test]
    async fn test_script_tool_expression_value() {
        let tool = ScriptRunTool;
        let result = tool
            .execute(ctx(), json!({"code": "sum([1,2,3])"}))
            .await
            .unwrap();
        assert_eq!(result.output.unwrap()["result"], "6");
    }

    #[tokio::test]
    async fn test_script_tool_rejects_import() {
        let tool = ScriptRunTool;
        let result = tool.execute(ctx(), json!({"code": "import os"})).await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_time_tool_default_format() {
        let tool = TimeNowTool;
        let result = tool.execute(ctx(), json!({})).await.unwrap();
        let time = result.output.unwrap()["time"].as_str().unwrap().to_string();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(time.len(), 19);
        assert_eq!(&time[4..5], "-");
    }

    #[tokio::test]
    async fn test_time_tool_custom_format_and_utc() {
        let tool = TimeNowTool;
        let result = tool
            .execute(ctx(), json!({"format": "%Y", "utc": true}))
            .await
            .unwrap();
        let year = result.output.unwrap()["time"].as_str().unwrap().to_string();
        assert_eq!(year.len(), 4);
        assert!(year.parse::<u32>().unwrap() >= 2024);
    }

    #[tokio::test]
    async fn test_time_tool_invalid_format() {
        let tool = TimeNowTool;
        let result = tool.execute(ctx(), json!({"format": "%Q%Q"})).await;
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[tokio::test]
    async fn test_file_read_tool() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("note.txt"), "hello").unwrap();

        let tool = FileReadTool::new(temp_dir.path()).unwrap();
        let result = tool
            .execute(ctx(), json!({"path": "note.txt"}))
            .await
            .unwrap();
        assert_eq!(result.output.unwrap()["content"], "hello");
    }

    #[tokio::test]
    async fn test_file_write_then_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let write = FileWriteTool::new(temp_dir.path()).unwrap();
        let read = FileReadTool::new(temp_dir.path()).unwrap();

        write
            .execute(ctx(), json!({"path": "out/data.txt", "content": "alpha"}))
            .await
            .unwrap();
        write
            .execute(
                ctx(),
                json!({"path": "out/data.txt", "content": "beta", "append": true}),
            )
            .await
            .unwrap();

        let result = read
            .execute(ctx(), json!({"path": "out/data.txt"}))
            .await
            .unwrap();
        assert_eq!(result.output.unwrap()["content"], "alphabeta");
    }

    #[tokio::test]
    async fn test_file_list_tool() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("b.txt"), "").unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();
        std::fs::write(temp_dir.path().join(".hidden"), "").unwrap();

        let tool = FileListTool::new(temp_dir.path()).unwrap();
        let result = tool.execute(ctx(), json!({})).await.unwrap();
        let output = result.output.unwrap();
        let entries = output["entries"].as_array().unwrap();

        let names: Vec<&str> = entries
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(entries[2]["kind"], "dir");
    }

    #[tokio::test]
    async fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool));

        assert!(registry.get("calculator").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_registry_chainable() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CalculatorTool))
            .register(Arc::new(ScriptRunTool));
        assert_eq!(registry.count(), 2);

        let tools = registry.list();
        assert!(tools.contains(&"calculator".to_string()));
        assert!(tools.contains(&"script.run".to_string()));
    }

    #[test]
    fn test_standard_registry_wires_all_tools() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ToolsConfig {
            workspace_root: temp_dir.path().to_path_buf(),
            ..ToolsConfig::default()
        };
        let registry = standard_registry(&config).unwrap();
        assert_eq!(registry.count(), 7);
        for name in [
            "calculator",
            "script.run",
            "file.read",
            "file.write",
            "file.list",
            "http.get",
            "time.now",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
    }

    #[test]
    fn test_registry_schemas_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool));
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0]["type"], "function");
        assert_eq!(schemas[0]["function"]["name"], "calculator");
        assert!(schemas[0]["function"]["parameters"]["properties"]["expression"].is_object());
    }

    #[tokio::test]
    async fn test_dispatcher_tool_not_found() {
        let registry = Arc::new(ToolRegistry::new());
        let dispatcher = ToolDispatcher::new(registry, 5000);

        let result = dispatcher
            .dispatch("session".into(), "nonexistent".into(), json!({}))
            .await;
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[tokio::test]
    async fn test_dispatcher_rejects_null_input() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool));
        let dispatcher = ToolDispatcher::new(Arc::new(registry), 5000);

        let result = dispatcher
            .dispatch("session".into(), "calculator".into(), serde_json::Value::Null)
            .await;
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_tool_error_messages() {
        assert_eq!(
            ToolError::Validation("bad".into()).to_string(),
            "Validation error: bad"
        );
        assert_eq!(
            ToolError::Execution("boom".into()).to_string(),
            "Execution failed: boom"
        );
        assert!(ToolError::SandboxViolation("x".into())
            .to_string()
            .contains("Sandbox violation"));
        assert_eq!(ToolError::Timeout.to_string(), "Operation timed out");
        assert_eq!(ToolError::Internal.to_string(), "Internal error");
    }

    #[test]
    fn test_execution_context_unique_refs() {
        let ctx1 = ExecutionContext::new("s1".into(), 1000);
        let ctx2 = ExecutionContext::new("s2".into(), 2000);
        assert_eq!(ctx1.session_key, "s1");
        assert_eq!(ctx1.timeout_ms, 1000);
        assert_ne!(ctx1.invocation_ref, ctx2.invocation_ref);
    }

    #[test]
    fn test_execution_context_serialization() {
        let ctx = ExecutionContext::new("session".into(), 5000);
        let serialized = serde_json::to_string(&ctx).unwrap();
        let deserialized: ExecutionContext = serde_json::from_str(&serialized).unwrap();
        assert_eq!(ctx.session_key, deserialized.session_key);
        assert_eq!(ctx.timeout_ms, deserialized.timeout_ms);
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult {
            success: true,
            output: Some(json!({"key": "value"})),
            error: None,
        };
        let serialized = serde_json::to_string(&result).unwrap();
        let deserialized: ToolResult = serde_json::from_str(&serialized).unwrap();
        assert_eq!(result.success, deserialized.success);
        assert_eq!(result.output, deserialized.output);
    }

    #[test]
    fn test_path_guard_requires_existing_root() {
        assert!(matches!(
            PathGuard::new("/does/not/exist"),
            Err(ToolError::SandboxViolation(_))
        ));
    }

    #[test]
    fn test_config_defaults_and_toml() {
        let config = ToolsConfig::default();
        assert_eq!(config.dispatch_timeout_ms, 30_000);
        assert_eq!(config.http_body_limit, 1000);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("tools.toml");
        std::fs::write(&path, "dispatch_timeout_ms = 1234\n").unwrap();
        let loaded = ToolsConfig::load(&path).unwrap();
        assert_eq!(loaded.dispatch_timeout_ms, 1234);
        assert_eq!(loaded.http_timeout_secs, 10);
    }
}
