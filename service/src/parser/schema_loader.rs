//! Schema loader for schema files and their local imports

use cas_linkml_core::{
    error::Result,
    types::SchemaDefinition,
};
use std::path::Path;
use std::sync::Arc;

use super::{AsyncSchemaParser, ImportResolver, Parser};
use crate::file_system_adapter::{FileSystemOperations, TokioFileSystemAdapter};

/// Loader for `LinkML` schema files
pub struct SchemaLoader<F: FileSystemOperations = TokioFileSystemAdapter> {
    fs: Arc<F>,
    parser: Parser<F>,
}

impl SchemaLoader<TokioFileSystemAdapter> {
    /// Create a new schema loader on the local file system
    #[must_use]
    pub fn new() -> Self {
        Self::with_fs(Arc::new(TokioFileSystemAdapter::new()))
    }
}

impl Default for SchemaLoader<TokioFileSystemAdapter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystemOperations> SchemaLoader<F> {
    /// Create a loader reading through `fs`
    #[must_use]
    pub fn with_fs(fs: Arc<F>) -> Self {
        Self {
            parser: Parser::new(Arc::clone(&fs)),
            fs,
        }
    }

    /// Load a schema from a file path, resolving imports next to it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an import
    /// cannot be resolved.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<SchemaDefinition> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading schema");
        let schema = self.parser.parse_file(path).await?;

        let search_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf);
        let resolver = ImportResolver::with_search_paths(vec![search_dir], Arc::clone(&self.fs));
        resolver.resolve_imports(&schema).await
    }
}
