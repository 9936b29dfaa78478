//! LinkML schema model
//!
//! A deliberately small subset of the LinkML metamodel: the parts the CAS
//! conversion reads or writes. Every struct round-trips through LinkML YAML;
//! unset fields are omitted on output so written schemas stay readable.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ordered annotation table (`annotations:` block)
pub type Annotations = IndexMap<String, AnnotationValue>;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Root schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    /// Unique identifier (IRI) of the schema
    pub id: String,
    /// Schema name
    pub name: String,
    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Schema description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Schema version string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// License identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Default prefix for minted URIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_prefix: Option<String>,
    /// Default range for slots without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_range: Option<String>,
    /// Imported schemas
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    /// Prefix definitions for URI expansion
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub prefixes: IndexMap<String, PrefixDefinition>,
    /// Class definitions indexed by name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub classes: IndexMap<String, ClassDefinition>,
    /// Top-level slot definitions indexed by name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub slots: IndexMap<String, SlotDefinition>,
    /// Type definitions indexed by name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub types: IndexMap<String, TypeDefinition>,
    /// Enum definitions indexed by name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumDefinition>,
    /// Schema-level annotations
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
}

impl SchemaDefinition {
    /// Create an empty schema with the given id and name
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Namespace IRI declared for `prefix`, if any
    #[must_use]
    pub fn prefix_reference(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(PrefixDefinition::reference)
    }

    /// Fill in element `name` fields from their map keys
    ///
    /// LinkML YAML usually leaves `name` implicit; downstream code relies on
    /// it being set.
    pub fn normalize_names(&mut self) {
        for (name, class) in &mut self.classes {
            if class.name.is_empty() {
                class.name.clone_from(name);
            }
            for (attr_name, attr) in &mut class.attributes {
                if attr.name.is_empty() {
                    attr.name.clone_from(attr_name);
                }
            }
            for (usage_name, usage) in &mut class.slot_usage {
                if usage.name.is_empty() {
                    usage.name.clone_from(usage_name);
                }
            }
        }
        for (name, slot) in &mut self.slots {
            if slot.name.is_empty() {
                slot.name.clone_from(name);
            }
        }
        for (name, type_def) in &mut self.types {
            if type_def.name.is_empty() {
                type_def.name.clone_from(name);
            }
        }
        for (name, enum_def) in &mut self.enums {
            if enum_def.name.is_empty() {
                enum_def.name.clone_from(name);
            }
            for (text, pv) in &mut enum_def.permissible_values {
                if pv.text.is_empty() {
                    pv.text.clone_from(text);
                }
            }
        }
    }
}

/// Prefix definition, either a bare IRI or the expanded LinkML form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefixDefinition {
    /// `prefix: http://example.org/`
    Simple(String),
    /// `prefix: {prefix_prefix: ..., prefix_reference: ...}`
    Complex {
        /// Prefix name
        prefix_prefix: String,
        /// Namespace IRI
        prefix_reference: String,
    },
}

impl PrefixDefinition {
    /// The namespace IRI
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::Simple(reference) => reference,
            Self::Complex {
                prefix_reference, ..
            } => prefix_reference,
        }
    }
}

impl From<&str> for PrefixDefinition {
    fn from(value: &str) -> Self {
        Self::Simple(value.to_string())
    }
}

impl From<String> for PrefixDefinition {
    fn from(value: String) -> Self {
        Self::Simple(value)
    }
}

/// Class definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDefinition {
    /// Class name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    /// Mixin classes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    /// Whether the class is abstract
    #[serde(rename = "abstract", skip_serializing_if = "is_false")]
    pub abstract_: bool,
    /// Whether the class is a mixin
    #[serde(skip_serializing_if = "is_false")]
    pub mixin: bool,
    /// Whether this class is the root of the data tree
    #[serde(skip_serializing_if = "is_false")]
    pub tree_root: bool,
    /// Explicit class URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_uri: Option<String>,
    /// References to top-level slots
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<String>,
    /// Slots owned by this class
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, SlotDefinition>,
    /// Refinements of inherited or referenced slots
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub slot_usage: IndexMap<String, SlotDefinition>,
    /// Class-level annotations
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
}

/// Slot definition, used for top-level slots, attributes and slot usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotDefinition {
    /// Slot name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Parent slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    /// Explicit slot URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_uri: Option<String>,
    /// Range: a type, class or enum name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Domain class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether a value is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Whether the slot holds a list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multivalued: Option<bool>,
    /// Whether the slot identifies its owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<bool>,
    /// Whether the slot is a (non-global) key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<bool>,
    /// Whether class-valued values are nested rather than referenced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined: Option<bool>,
    /// Whether inlined values are written as a list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined_as_list: Option<bool>,
    /// Regular expression string values must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Inclusive numeric lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_value: Option<Value>,
    /// Inclusive numeric upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_value: Option<Value>,
    /// Alternative ranges
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<AnonymousSlotExpression>,
    /// Slot-level annotations
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
}

impl SlotDefinition {
    /// Create a slot with a name and range
    #[must_use]
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: Some(range.into()),
            ..Self::default()
        }
    }

    /// Copy every field set on `refinement` over this slot
    pub fn apply(&mut self, refinement: &SlotDefinition) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if refinement.$field.is_some() {
                    self.$field.clone_from(&refinement.$field);
                })*
            };
        }
        overlay!(
            description,
            title,
            is_a,
            slot_uri,
            range,
            domain,
            required,
            multivalued,
            identifier,
            key,
            inlined,
            inlined_as_list,
            pattern,
            minimum_value,
            maximum_value
        );
        if !refinement.any_of.is_empty() {
            self.any_of.clone_from(&refinement.any_of);
        }
        for (tag, value) in &refinement.annotations {
            self.annotations.insert(tag.clone(), value.clone());
        }
    }

    /// `multivalued` with its LinkML default
    #[must_use]
    pub fn is_multivalued(&self) -> bool {
        self.multivalued.unwrap_or(false)
    }

    /// `required` with its LinkML default
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false) || self.is_identifier()
    }

    /// `identifier` with its LinkML default
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.identifier.unwrap_or(false)
    }
}

/// Anonymous range expression used in `any_of`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymousSlotExpression {
    /// Alternative range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// Type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefinition {
    /// Type name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Parent type
    #[serde(rename = "typeof", skip_serializing_if = "Option::is_none")]
    pub typeof_: Option<String>,
    /// Datatype URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Implementation base type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pattern inherited by slots of this type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Enum definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDefinition {
    /// Enum name
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit enum URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_uri: Option<String>,
    /// Static permissible values
    #[serde(
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "deserialize_permissible_values"
    )]
    pub permissible_values: IndexMap<String, PermissibleValue>,
    /// Ontology query defining the value set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable_from: Option<ReachabilityQuery>,
    /// Enum-level annotations
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: Annotations,
}

impl EnumDefinition {
    /// Whether values come from an ontology query rather than a fixed list
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.reachable_from.is_some()
    }
}

/// A single enum value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissibleValue {
    /// Value text (the map key)
    #[serde(skip_serializing)]
    pub text: String,
    /// Description, usually the ontology label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ontology term the value stands for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

fn deserialize_permissible_values<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, PermissibleValue>, D::Error>
where
    D: Deserializer<'de>,
{
    // `text:` with no body is legal LinkML and arrives as null
    let raw = IndexMap::<String, Option<PermissibleValue>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(text, pv)| {
            let mut pv = pv.unwrap_or_default();
            pv.text.clone_from(&text);
            (text, pv)
        })
        .collect())
}

/// Ontology traversal defining a dynamic enum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilityQuery {
    /// Ontology to query, as a CURIE such as `obo:cl`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ontology: Option<String>,
    /// Start nodes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_nodes: Vec<String>,
    /// Relations to follow
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationship_types: Vec<String>,
    /// Only direct neighbours
    #[serde(skip_serializing_if = "is_false")]
    pub is_direct: bool,
    /// Include the start nodes themselves
    #[serde(skip_serializing_if = "is_false")]
    pub include_self: bool,
    /// Walk towards ancestors instead of descendants
    #[serde(skip_serializing_if = "is_false")]
    pub traverse_up: bool,
}

/// Annotation value as it appears in LinkML YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Plain string
    String(String),
    /// Boolean
    Bool(bool),
    /// Number
    Number(serde_json::Number),
    /// List of values
    List(Vec<AnnotationValue>),
    /// Nested mapping, including the `{tag, value}` long form
    Object(IndexMap<String, AnnotationValue>),
}

impl AnnotationValue {
    /// The value as a string slice when it is a plain string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Object(map) => map.get("value").and_then(Self::as_str),
            _ => None,
        }
    }

    /// Flatten to string items, splitting comma-separated strings
    #[must_use]
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::Bool(b) => vec![b.to_string()],
            Self::Number(n) => vec![n.to_string()],
            Self::List(items) => items.iter().flat_map(Self::items).collect(),
            Self::Object(map) => map.get("value").map(Self::items).unwrap_or_default(),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissible_values_accept_null_bodies() {
        let yaml = r"
name: Colour
permissible_values:
  red:
  green:
    meaning: EX:0001
";
        let enum_def: EnumDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(enum_def.permissible_values.len(), 2);
        assert_eq!(enum_def.permissible_values["red"].text, "red");
        assert_eq!(
            enum_def.permissible_values["green"].meaning.as_deref(),
            Some("EX:0001")
        );
    }

    #[test]
    fn test_slot_apply_overlays_only_set_fields() {
        let mut slot = SlotDefinition::new("age", "integer");
        slot.description = Some("Age in years".to_string());
        let refinement = SlotDefinition {
            required: Some(true),
            ..SlotDefinition::default()
        };
        slot.apply(&refinement);
        assert_eq!(slot.range.as_deref(), Some("integer"));
        assert_eq!(slot.description.as_deref(), Some("Age in years"));
        assert!(slot.is_required());
    }

    #[test]
    fn test_annotation_items_split_commas() {
        let value = AnnotationValue::from("SubClassOf, ObjectSomeValuesFrom");
        assert_eq!(value.items(), vec!["SubClassOf", "ObjectSomeValuesFrom"]);
    }

    #[test]
    fn test_annotation_long_form() {
        let yaml = "tag: owl\nvalue: Class\n";
        let value: AnnotationValue = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(value.as_str(), Some("Class"));
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let schema = SchemaDefinition::new("https://example.org/s", "s");
        let yaml = serde_yaml::to_string(&schema).unwrap();
        assert_eq!(yaml, "id: https://example.org/s\nname: s\n");
    }
}
