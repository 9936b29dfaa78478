//! File system access behind a trait
//!
//! Parsers and the pipeline read and write through [`FileSystemOperations`]
//! so tests can confine them to a temporary directory.

use async_trait::async_trait;
use cas_linkml_core::error::{LinkMLError, Result};
use std::path::{Component, Path, PathBuf};

/// Async file operations used by the conversion pipeline
#[async_trait]
pub trait FileSystemOperations: Send + Sync {
    /// Read a whole file as UTF-8
    async fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or truncate a file and write `content`
    async fn write(&self, path: &Path, content: &str) -> Result<()>;

    /// Whether the path exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Remove a file; a missing file is not an error
    async fn remove_file(&self, path: &Path) -> Result<()>;
}

/// Tokio-backed file system adapter, optionally sandboxed to a root directory
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystemAdapter {
    root: Option<PathBuf>,
}

impl TokioFileSystemAdapter {
    /// Unrestricted adapter
    #[must_use]
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Adapter that resolves relative paths under `root` and refuses to leave it
    #[must_use]
    pub fn sandboxed(root: PathBuf) -> Self {
        Self { root: Some(root) }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(path.to_path_buf());
        };
        if path.is_absolute() {
            if path.starts_with(root) {
                return Ok(path.to_path_buf());
            }
            return Err(LinkMLError::io(format!(
                "Path {} is outside sandbox {}",
                path.display(),
                root.display()
            )));
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(LinkMLError::io(format!(
                "Path {} escapes sandbox {}",
                path.display(),
                root.display()
            )));
        }
        Ok(root.join(path))
    }
}

#[async_trait]
impl FileSystemOperations for TokioFileSystemAdapter {
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| LinkMLError::io(format!("Failed to read {}: {e}", resolved.display())))
    }

    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| LinkMLError::io(format!("Failed to write {}: {e}", resolved.display())))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let resolved = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&resolved).await?)
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let resolved = self.resolve(path)?;
        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sandboxed_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let fs = TokioFileSystemAdapter::sandboxed(temp_dir.path().to_path_buf());

        fs.write(Path::new("out/schema.yaml"), "id: x\n").await?;
        assert!(fs.exists(Path::new("out/schema.yaml")).await?);
        assert_eq!(fs.read_to_string(Path::new("out/schema.yaml")).await?, "id: x\n");

        fs.remove_file(Path::new("out/schema.yaml")).await?;
        assert!(!fs.exists(Path::new("out/schema.yaml")).await?);
        // removing twice is fine
        fs.remove_file(Path::new("out/schema.yaml")).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_sandbox_rejects_parent_dir() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let fs = TokioFileSystemAdapter::sandboxed(temp_dir.path().to_path_buf());
        let result = fs.read_to_string(Path::new("../etc/passwd")).await;
        assert!(matches!(result, Err(LinkMLError::IoError(_))));
        Ok(())
    }
}
