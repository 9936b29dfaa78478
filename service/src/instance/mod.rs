//! Instance data
//!
//! Annotation data arrives as plain JSON (or YAML). [`instantiate`] checks it
//! against a class of the schema and produces a typed [`InstanceObject`]
//! tree for the dumpers.

use cas_linkml_core::error::{LinkMLError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

use crate::file_system_adapter::FileSystemOperations;

mod instantiate;

pub use instantiate::instantiate;

/// A typed object of some class
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceObject {
    /// Class the object was instantiated as
    pub class_name: String,
    /// Value of the class's identifier slot, if it has one
    pub identifier: Option<String>,
    /// Slot values in document order
    pub fields: IndexMap<String, InstanceValue>,
}

impl InstanceObject {
    /// Empty object of `class_name`
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            identifier: None,
            fields: IndexMap::new(),
        }
    }

    /// Value of a slot
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&InstanceValue> {
        self.fields.get(slot)
    }

    /// Every object in this tree, depth first, starting with `self`
    #[must_use]
    pub fn walk(&self) -> Vec<&InstanceObject> {
        let mut objects = vec![self];
        for value in self.fields.values() {
            value.collect_objects(&mut objects);
        }
        objects
    }
}

/// A typed slot value
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceValue {
    /// `string`
    String(String),
    /// `integer`
    Integer(i64),
    /// `float` and `double`
    Float(f64),
    /// `boolean`
    Boolean(bool),
    /// `date`, kept in its ISO 8601 lexical form
    Date(String),
    /// `datetime`, kept in its ISO 8601 lexical form
    Datetime(String),
    /// `uri` or `uriorcurie`
    Uri(String),
    /// Enum value with the ontology term it stands for
    Enum {
        /// Permissible value text
        text: String,
        /// CURIE or IRI of the meaning
        meaning: Option<String>,
    },
    /// Reference to an object by identifier
    Reference {
        /// Range class
        class: String,
        /// Identifier value
        id: String,
    },
    /// Nested object
    Object(Box<InstanceObject>),
    /// Multivalued slot
    List(Vec<InstanceValue>),
    /// Free-form JSON for `Any` ranges
    Opaque(Value),
}

impl InstanceValue {
    /// Single values of this value: the items of a list, or itself
    #[must_use]
    pub fn items(&self) -> Vec<&InstanceValue> {
        match self {
            Self::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Lexical form of scalar values
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) | Self::Date(s) | Self::Datetime(s) | Self::Uri(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Enum { text, .. } => Some(text.clone()),
            Self::Reference { id, .. } => Some(id.clone()),
            Self::Object(_) | Self::List(_) | Self::Opaque(_) => None,
        }
    }

    fn collect_objects<'a>(&'a self, objects: &mut Vec<&'a InstanceObject>) {
        match self {
            Self::Object(object) => {
                objects.push(object);
                for value in object.fields.values() {
                    value.collect_objects(objects);
                }
            }
            Self::List(items) => {
                for item in items {
                    item.collect_objects(objects);
                }
            }
            _ => {}
        }
    }
}

/// Load an instance document, JSON or YAML by extension
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read and a parse error for
/// malformed content or unknown extensions.
pub async fn load_instance<F: FileSystemOperations + ?Sized>(fs: &F, path: &Path) -> Result<Value> {
    let content = fs.read_to_string(path).await?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let value: Value = match extension.as_str() {
        "json" => serde_json::from_str(&content)?,
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        other => return Err(LinkMLError::invalid_format(other)),
    };
    tracing::debug!(path = %path.display(), "loaded instance data");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_system_adapter::TokioFileSystemAdapter;
    use tempfile::TempDir;

    #[test]
    fn test_walk_visits_nested_objects() {
        let mut child = InstanceObject::new("Annotation");
        child.identifier = Some("CS:1".to_string());
        let mut root = InstanceObject::new("Taxonomy");
        root.fields.insert(
            "annotations".to_string(),
            InstanceValue::List(vec![
                InstanceValue::Object(Box::new(child.clone())),
                InstanceValue::String("x".to_string()),
            ]),
        );
        let classes: Vec<&str> = root.walk().iter().map(|o| o.class_name.as_str()).collect();
        assert_eq!(classes, vec!["Taxonomy", "Annotation"]);
    }

    #[test]
    fn test_items_of_scalar() {
        let value = InstanceValue::Integer(3);
        assert_eq!(value.items(), vec![&value]);
        assert_eq!(value.as_text().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_load_yaml_instance() -> std::result::Result<(), anyhow::Error> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("data.yaml");
        std::fs::write(&path, "labelsets:\n  - name: Class\n")?;
        let value = load_instance(&TokioFileSystemAdapter::new(), &path).await?;
        assert_eq!(value["labelsets"][0]["name"], "Class");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_extension() -> std::result::Result<(), anyhow::Error> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("data.csv");
        std::fs::write(&path, "a,b\n")?;
        assert!(load_instance(&TokioFileSystemAdapter::new(), &path).await.is_err());
        Ok(())
    }
}
