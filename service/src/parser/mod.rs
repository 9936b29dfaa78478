//! Schema parsing for LinkML schemas in YAML and JSON formats
//!
//! [`YamlParser`] and [`JsonParser`] do the deserialization; [`Parser`] picks
//! one by file extension and reads through a [`FileSystemOperations`]
//! adapter. [`ImportResolver`] and [`SchemaLoader`] build on top of it.

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use std::path::Path;
use std::sync::Arc;

use crate::file_system_adapter::{FileSystemOperations, TokioFileSystemAdapter};

pub mod import_resolver;
pub mod json_parser;
pub mod schema_loader;
pub mod yaml_parser;

pub use import_resolver::ImportResolver;
pub use json_parser::JsonParser;
pub use schema_loader::SchemaLoader;
pub use yaml_parser::YamlParser;

/// Trait for schema parsers
pub trait SchemaParser: Send + Sync {
    /// Parse schema from string content
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if parsing fails
    fn parse_str(&self, content: &str) -> Result<SchemaDefinition>;

    /// Parse schema from file
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if:
    /// - File cannot be read
    /// - Parsing fails
    fn parse_file(&self, path: &Path) -> Result<SchemaDefinition>;
}

/// Async version of the `SchemaParser` trait
#[async_trait::async_trait]
pub trait AsyncSchemaParser: Send + Sync {
    /// Parse schema from string content in the given format
    async fn parse_str(&self, content: &str, format: &str) -> Result<SchemaDefinition>;

    /// Parse schema from file, detecting format from extension
    async fn parse_file(&self, path: &Path) -> Result<SchemaDefinition>;
}

/// Main parser for LinkML schemas
///
/// Supports both YAML and JSON formats with format detection from the file
/// extension.
pub struct Parser<F: FileSystemOperations = TokioFileSystemAdapter> {
    fs: Arc<F>,
    yaml_parser: YamlParser,
    json_parser: JsonParser,
}

impl Parser<TokioFileSystemAdapter> {
    /// Parser reading from the local file system
    #[must_use]
    pub fn local() -> Self {
        Self::new(Arc::new(TokioFileSystemAdapter::new()))
    }
}

impl<F: FileSystemOperations> Parser<F> {
    /// Create a parser reading through `fs`
    #[must_use]
    pub fn new(fs: Arc<F>) -> Self {
        Self {
            fs,
            yaml_parser: YamlParser::new(),
            json_parser: JsonParser::new(),
        }
    }

    /// Parse schema from string with specified format
    ///
    /// # Errors
    ///
    /// Returns a `LinkMLError` if the format is not supported or parsing fails.
    pub fn parse_str_sync(&self, content: &str, format: &str) -> Result<SchemaDefinition> {
        match format.to_lowercase().as_str() {
            "yaml" | "yml" => self.yaml_parser.parse_str(content),
            "json" => self.json_parser.parse_str(content),
            _ => Err(LinkMLError::invalid_format(format)),
        }
    }
}

#[async_trait::async_trait]
impl<F: FileSystemOperations> AsyncSchemaParser for Parser<F> {
    async fn parse_str(&self, content: &str, format: &str) -> Result<SchemaDefinition> {
        self.parse_str_sync(content, format)
    }

    async fn parse_file(&self, path: &Path) -> Result<SchemaDefinition> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LinkMLError::parse(format!("No file extension for: {}", path.display())))?;

        let content = self.fs.read_to_string(path).await?;

        self.parse_str_sync(&content, extension).map_err(|e| match e {
            LinkMLError::ParseError { message, location } => LinkMLError::ParseError {
                message: format!("{message} in file {}", path.display()),
                location,
            },
            other => other,
        })
    }
}
