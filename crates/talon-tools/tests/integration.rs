#[cfg(test)]
mod integration_tests {
    use serde_json::json;
    use std::sync::Arc;
    use talon_tools::*;

    fn dispatcher_with_defaults(workspace: &std::path::Path) -> ToolDispatcher {
        let config = ToolsConfig {
            workspace_root: workspace.to_path_buf(),
            ..ToolsConfig::default()
        };
        let registry = standard_registry(&config).unwrap();
        ToolDispatcher::new(Arc::new(registry), config.dispatch_timeout_ms)
    }

    #[tokio::test]
    async fn test_calculator_through_dispatcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        let result = dispatcher
            .dispatch(
                "session".into(),
                "calculator".into(),
                json!({"expression": "sqrt(16)"}),
            )
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output.unwrap()["result"], "4");
    }

    #[tokio::test]
    async fn test_script_through_dispatcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        let result = dispatcher
            .dispatch(
                "session".into(),
                "script.run".into(),
                json!({"code": "print(sum([x * x for x in range(4)]))"}),
            )
            .await
            .unwrap();
        assert_eq!(result.output.unwrap()["result"], "14");
    }

    #[tokio::test]
    async fn test_dispatch_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        let input = json!({"code": "acc = 0\nfor i in range(10):\n    acc += i\nprint(acc)"});
        let first = dispatcher
            .dispatch("s".into(), "script.run".into(), input.clone())
            .await
            .unwrap();
        let second = dispatcher
            .dispatch("s".into(), "script.run".into(), input)
            .await
            .unwrap();
        assert_eq!(first.output, second.output);

        // A third, unrelated call sees none of the earlier bindings.
        let third = dispatcher
            .dispatch("s".into(), "script.run".into(), json!({"code": "print(acc)"}))
            .await;
        assert!(third.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_script_outputs_do_not_interleave() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = Arc::new(dispatcher_with_defaults(temp_dir.path()));

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                let code = format!(
                    "for _ in range(200):\n    print('task-{i}')"
                );
                let result = dispatcher
                    .dispatch(format!("session-{i}"), "script.run".into(), json!({"code": code}))
                    .await
                    .unwrap();
                (i, result)
            }));
        }

        for handle in handles {
            let (i, result) = handle.await.unwrap();
            let output = result.output.unwrap();
            let text = output["result"].as_str().unwrap();
            let expected = format!("task-{i}");
            assert_eq!(text.lines().count(), 200);
            assert!(
                text.lines().all(|line| line == expected),
                "output of task {i} was corrupted"
            );
        }
    }

    #[tokio::test]
    async fn test_file_workflow_through_dispatcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        dispatcher
            .dispatch(
                "s".into(),
                "file.write".into(),
                json!({"path": "notes/a.txt", "content": "first"}),
            )
            .await
            .unwrap();

        let read = dispatcher
            .dispatch("s".into(), "file.read".into(), json!({"path": "notes/a.txt"}))
            .await
            .unwrap();
        assert_eq!(read.output.unwrap()["content"], "first");

        let listing = dispatcher
            .dispatch("s".into(), "file.list".into(), json!({"path": "notes"}))
            .await
            .unwrap();
        let output = listing.output.unwrap();
        let entries = output["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["name"], "a.txt");
    }

    #[tokio::test]
    async fn test_sandbox_violation_surfaces_through_dispatcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        let result = dispatcher
            .dispatch(
                "s".into(),
                "file.read".into(),
                json!({"path": "../escape.txt"}),
            )
            .await;
        assert!(matches!(result, Err(ToolError::SandboxViolation(_))));
    }

    #[tokio::test]
    async fn test_time_through_dispatcher() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher_with_defaults(temp_dir.path());

        let result = dispatcher
            .dispatch(
                "s".into(),
                "time.now".into(),
                json!({"format": "%Y-%m-%d", "utc": true}),
            )
            .await
            .unwrap();
        let output = result.output.unwrap();
        assert_eq!(output["time"].as_str().unwrap().len(), 10);
    }

    #[tokio::test]
    #[ignore] // Timing-sensitive; the runaway loop keeps a blocking thread busy.
    async fn test_runaway_script_hits_dispatcher_timeout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ToolsConfig {
            workspace_root: temp_dir.path().to_path_buf(),
            dispatch_timeout_ms: 200,
            ..ToolsConfig::default()
        };
        let registry = standard_registry(&config).unwrap();
        let dispatcher = ToolDispatcher::new(Arc::new(registry), config.dispatch_timeout_ms);

        let result = dispatcher
            .dispatch(
                "s".into(),
                "script.run".into(),
                json!({"code": "n = 0\nwhile True:\n    n += 1"}),
            )
            .await;
        assert!(matches!(result, Err(ToolError::Timeout)));
    }
}
