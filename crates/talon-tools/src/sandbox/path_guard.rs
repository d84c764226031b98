use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ToolError;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Confines every path the file tools touch to a canonicalized workspace
/// root. Resolution that escapes the root — via absolute paths, `..`
/// traversal, or symlinks — is rejected, never silently corrected.
pub struct PathGuard {
    workspace_root: PathBuf,
}

impl PathGuard {
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = fs::canonicalize(workspace_root)
            .map_err(|e| ToolError::SandboxViolation(format!("Invalid workspace root: {e}")))?;
        Ok(Self {
            workspace_root: root,
        })
    }

    /// Validates a path that must already exist (reads, listings).
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let path = path.as_ref();
        self.reject_escapes(path)?;

        let full_path = self.workspace_root.join(path);

        // Canonicalize to resolve symlinks before the boundary check.
        let canonical = fs::canonicalize(&full_path).map_err(|_| {
            ToolError::SandboxViolation("Path does not exist or is inaccessible".into())
        })?;

        if !canonical.starts_with(&self.workspace_root) {
            return Err(ToolError::SandboxViolation("Path escapes workspace".into()));
        }

        if let Ok(metadata) = fs::metadata(&canonical) {
            if metadata.is_file() && metadata.len() > MAX_FILE_SIZE {
                return Err(ToolError::SandboxViolation("File too large".into()));
            }
        }

        Ok(canonical)
    }

    /// Validates a path that may not exist yet (write targets). Every
    /// existing component is checked so a symlink planted midway cannot
    /// carry the write outside the root.
    pub fn validate_new(&self, path: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let path = path.as_ref();
        self.reject_escapes(path)?;

        let full_path = self.workspace_root.join(path);

        let mut current = self.workspace_root.clone();
        if let Ok(relative) = full_path.strip_prefix(&self.workspace_root) {
            for component in relative.components() {
                current.push(component);
                if current.exists() {
                    if let Ok(canonical) = fs::canonicalize(&current) {
                        if !canonical.starts_with(&self.workspace_root) {
                            return Err(ToolError::SandboxViolation(
                                "Symlink escapes workspace".into(),
                            ));
                        }
                    }
                }
            }
        }

        Ok(full_path)
    }

    fn reject_escapes(&self, path: &Path) -> Result<(), ToolError> {
        if path.is_absolute() {
            return Err(ToolError::SandboxViolation(
                "Absolute paths not allowed".into(),
            ));
        }
        if path.to_string_lossy().contains("..") {
            return Err(ToolError::SandboxViolation(
                "Path traversal detected".into(),
            ));
        }
        Ok(())
    }
}
