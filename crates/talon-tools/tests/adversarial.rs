//! Hostile-input suite for the sandboxed computation tools and the file
//! tools. Every case here is a way model-generated text has tried (or
//! could try) to reach past the allowlists.

#[cfg(test)]
mod adversarial_tests {
    use serde_json::json;
    use talon_tools::tools::*;
    use talon_tools::{ExecutionContext, ToolError};

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("adversarial".into(), 5000)
    }

    async fn calc(expression: &str) -> Result<ToolResult, ToolError> {
        CalculatorTool
            .execute(ctx(), json!({ "expression": expression }))
            .await
    }

    async fn run(code: &str) -> Result<ToolResult, ToolError> {
        ScriptRunTool.execute(ctx(), json!({ "code": code })).await
    }

    // Calculator: nothing outside the arithmetic grammar may evaluate.

    #[tokio::test]
    async fn test_calculator_blocks_process_spawning() {
        let result = calc("os.system('ls')").await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_calculator_blocks_dunder_names() {
        for expression in ["__import__", "__builtins__ + 1", "abs.__call__(1)"] {
            let result = calc(expression).await;
            assert!(result.is_err(), "{expression} must not evaluate");
        }
    }

    #[tokio::test]
    async fn test_calculator_blocks_strings_and_collections() {
        for expression in ["'ls'", "[1, 2]", "{1: 2}", "(1,)"] {
            let result = calc(expression).await;
            assert!(result.is_err(), "{expression} must not evaluate");
        }
    }

    #[tokio::test]
    async fn test_calculator_blocks_assignment_and_statements() {
        for expression in ["x = 1", "1; 2", "if 1 then 2"] {
            let result = calc(expression).await;
            assert!(result.is_err(), "{expression} must not evaluate");
        }
    }

    #[tokio::test]
    async fn test_calculator_survives_division_by_zero() {
        let result = calc("1/0").await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_calculator_survives_pathological_nesting() {
        let expression = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let result = calc(&expression).await;
        assert_eq!(result.unwrap().output.unwrap()["result"], "1");
    }

    // Script runner: the environment is the whole world; nothing outside it
    // may resolve.

    #[tokio::test]
    async fn test_script_blocks_import_in_every_spelling() {
        for code in [
            "import os",
            "import os, sys",
            "from os import path",
            "__import__('os')",
        ] {
            let result = run(code).await;
            assert!(
                matches!(result, Err(ToolError::Execution(_))),
                "{code} must fail"
            );
        }
    }

    #[tokio::test]
    async fn test_script_blocks_file_and_process_primitives() {
        for code in [
            "open('/etc/passwd')",
            "exec('1')",
            "eval('1')",
            "compile('1', 's', 'eval')",
            "globals()",
            "locals()",
            "vars()",
            "getattr(1, 'x')",
            "setattr(1, 'x', 2)",
        ] {
            let result = run(code).await;
            assert!(
                matches!(result, Err(ToolError::Execution(_))),
                "{code} must fail"
            );
        }
    }

    #[tokio::test]
    async fn test_script_blocks_attribute_escapes() {
        for code in [
            "(1).__class__",
            "().__class__.__bases__",
            "'x'.__class__",
            "[].__len__()",
            "math.__dict__",
        ] {
            let result = run(code).await;
            assert!(
                matches!(result, Err(ToolError::Execution(_))),
                "{code} must fail"
            );
        }
    }

    #[tokio::test]
    async fn test_script_blocks_callable_definitions() {
        for code in [
            "def f():\n    pass",
            "class C:\n    pass",
            "f = lambda: 1",
        ] {
            let result = run(code).await;
            assert!(
                matches!(result, Err(ToolError::Execution(_))),
                "{code} must fail"
            );
        }
    }

    #[tokio::test]
    async fn test_script_blocks_exception_machinery() {
        for code in [
            "try:\n    pass\nexcept:\n    pass",
            "raise ValueError('x')",
            "with open('f') as f:\n    pass",
        ] {
            let result = run(code).await;
            assert!(
                matches!(result, Err(ToolError::Execution(_))),
                "{code} must fail"
            );
        }
    }

    #[tokio::test]
    async fn test_script_shadowing_math_gains_nothing() {
        // Rebinding 'math' only shadows it with an inert value.
        let result = run("math = 5\nprint(math + 1)").await.unwrap();
        assert_eq!(result.output.unwrap()["result"], "6");
    }

    #[tokio::test]
    async fn test_script_bounds_range_materialization() {
        let result = run("list(range(10 ** 12))").await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_script_integer_overflow_is_contained() {
        let result = run("9223372036854775807 + 1").await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_no_state_survives_between_invocations() {
        run("leak = 'secret'").await.unwrap();
        let result = run("print(leak)").await;
        assert!(matches!(result, Err(ToolError::Execution(_))));
    }

    #[tokio::test]
    async fn test_error_messages_do_not_leak_host_detail() {
        let err = match run("boom()").await {
            Err(ToolError::Execution(message)) => message,
            other => panic!("expected execution error, got {other:?}"),
        };
        assert!(err.contains("boom"));
        assert!(!err.contains('/'), "no paths in fault text: {err}");
        assert!(!err.contains("src"), "no source locations: {err}");
    }

    // File tools: the workspace boundary holds against the classic attacks.

    #[tokio::test]
    async fn test_file_read_blocks_absolute_and_traversal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tool = FileReadTool::new(temp_dir.path()).unwrap();

        for path in ["/etc/passwd", "../../../etc/passwd", "a/../../b"] {
            let result = tool.execute(ctx(), json!({ "path": path })).await;
            assert!(
                matches!(result, Err(ToolError::SandboxViolation(_))),
                "{path} must be blocked"
            );
        }
    }

    #[tokio::test]
    async fn test_file_write_blocks_escaping_targets() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tool = FileWriteTool::new(temp_dir.path()).unwrap();

        for path in ["/tmp/evil.txt", "../evil.txt"] {
            let result = tool
                .execute(ctx(), json!({ "path": path, "content": "x" }))
                .await;
            assert!(
                matches!(result, Err(ToolError::SandboxViolation(_))),
                "{path} must be blocked"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_read_blocks_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("link")).unwrap();

        let tool = FileReadTool::new(temp_dir.path()).unwrap();
        let result = tool
            .execute(ctx(), json!({ "path": "link/secret.txt" }))
            .await;
        assert!(matches!(result, Err(ToolError::SandboxViolation(_))));
    }
}
