//! JSON schema parser for LinkML schemas serialized as JSON

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use std::{fs, path::Path};

use super::SchemaParser;

/// Stateless JSON parser
#[derive(Default, Debug, Clone, Copy)]
pub struct JsonParser;

impl JsonParser {
    /// Create a new JSON parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SchemaParser for JsonParser {
    fn parse_str(&self, content: &str) -> Result<SchemaDefinition> {
        let mut schema: SchemaDefinition = serde_json::from_str(content).map_err(|e| {
            LinkMLError::parse_at(
                format!("JSON deserialization error: {e}"),
                format!("line {}, column {}", e.line(), e.column()),
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
