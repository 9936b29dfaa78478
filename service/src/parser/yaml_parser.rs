//! YAML schema parser
//!
//! Performs the actual `serde_yaml` deserialization for LinkML YAML and fills
//! in element names from their map keys.

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use std::{fs, path::Path};

use super::SchemaParser;

/// Stateless YAML parser
#[derive(Default, Debug, Clone, Copy)]
pub struct YamlParser;

impl YamlParser {
    /// Create a new YAML parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaParser for YamlParser {
    fn parse_str(&self, content: &str) -> Result<SchemaDefinition> {
        let mut schema: SchemaDefinition = serde_yaml::from_str(content).map_err(|e| {
            LinkMLError::parse_at(
                format!("YAML parsing error: {e}"),
                e.location().map_or_else(
                    || "unknown location".to_string(),
                    |l| format!("line {}, column {}", l.line(), l.column()),
                ),
            )
        })?;
        schema.normalize_names();
        Ok(schema)
    }

    fn parse_file(&self, path: &Path) -> Result<SchemaDefinition> {
        let content = fs::read_to_string(path).map_err(LinkMLError::IoError)?;
        self.parse_str(&content).map_err(|e| match e {
            LinkMLError::ParseError { message, location } => LinkMLError::ParseError {
                message: format!("{message} in file {}", path.display()),
                location,
            },
            other => other,
        })
    }
}
