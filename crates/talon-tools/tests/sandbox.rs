#[cfg(test)]
mod sandbox_tests {
    use talon_tools::sandbox::PathGuard;
    use talon_tools::ToolError;

    fn guarded_dir() -> (tempfile::TempDir, PathGuard) {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = PathGuard::new(temp_dir.path()).unwrap();
        (temp_dir, guard)
    }

    #[test]
    fn test_relative_path_inside_root_is_accepted() {
        let (temp_dir, guard) = guarded_dir();
        std::fs::write(temp_dir.path().join("file.txt"), "data").unwrap();

        let validated = guard.validate("file.txt").unwrap();
        assert!(validated.starts_with(temp_dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_nested_path_is_accepted() {
        let (temp_dir, guard) = guarded_dir();
        std::fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        std::fs::write(temp_dir.path().join("a/b/c.txt"), "data").unwrap();

        assert!(guard.validate("a/b/c.txt").is_ok());
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_temp_dir, guard) = guarded_dir();
        assert!(matches!(
            guard.validate("/etc/passwd"),
            Err(ToolError::SandboxViolation(_))
        ));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_temp_dir, guard) = guarded_dir();
        assert!(matches!(
            guard.validate("../outside.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
        assert!(matches!(
            guard.validate("a/../../outside.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
    }

    #[test]
    fn test_missing_path_rejected_for_reads() {
        let (_temp_dir, guard) = guarded_dir();
        assert!(matches!(
            guard.validate("missing.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
    }

    #[test]
    fn test_validate_new_accepts_missing_target() {
        let (temp_dir, guard) = guarded_dir();
        let path = guard.validate_new("fresh/dir/file.txt").unwrap();
        assert!(path.starts_with(temp_dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_validate_new_rejects_absolute_and_traversal() {
        let (_temp_dir, guard) = guarded_dir();
        assert!(matches!(
            guard.validate_new("/tmp/out.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
        assert!(matches!(
            guard.validate_new("../out.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let (temp_dir, guard) = guarded_dir();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("link")).unwrap();

        assert!(matches!(
            guard.validate("link/secret.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
        assert!(matches!(
            guard.validate_new("link/new.txt"),
            Err(ToolError::SandboxViolation(_))
        ));
    }
}
