//! Writing LinkML schemas back to YAML

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::SchemaDefinition,
};
use std::path::Path;

use crate::file_system_adapter::FileSystemOperations;

/// Serialize a schema as LinkML YAML
///
/// # Errors
///
/// Returns a serialization error if YAML encoding fails.
pub fn schema_to_yaml(schema: &SchemaDefinition) -> Result<String> {
    serde_yaml::to_string(schema).map_err(|e| LinkMLError::serialization(e.to_string()))
}

/// Write a schema as LinkML YAML, replacing any existing file
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub async fn write_schema<F: FileSystemOperations>(
    fs: &F,
    schema: &SchemaDefinition,
    path: &Path,
) -> Result<()> {
    let yaml = schema_to_yaml(schema)?;
    fs.write(path, &yaml).await?;
    tracing::info!(
        path = %path.display(),
        classes = schema.classes.len(),
        enums = schema.enums.len(),
        "wrote LinkML schema"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system_adapter::TokioFileSystemAdapter;
    use crate::parser::{SchemaParser, YamlParser};
    use cas_linkml_core::types::{ClassDefinition, SlotDefinition};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_written_schema_parses_back() -> std::result::Result<(), anyhow::Error> {
        let mut schema = SchemaDefinition::new("https://example.org/s", "s");
        let mut class = ClassDefinition::default();
        class
            .attributes
            .insert("name".to_string(), SlotDefinition::new("name", "string"));
        schema.classes.insert("Labelset".to_string(), class);

        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("s.yaml");
        write_schema(&TokioFileSystemAdapter::new(), &schema, &path).await?;

        let parsed = YamlParser::new().parse_file(&path)?;
        assert_eq!(parsed.classes["Labelset"].attributes["name"].range.as_deref(), Some("string"));
        Ok(())
    }
}
