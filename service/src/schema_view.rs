//! Induced-schema queries
//!
//! LinkML lets a slot be declared once at the top level and refined by
//! every class that uses it. [`SchemaView`] resolves those layers so the
//! instantiation step and the dumpers see a single effective definition per
//! class and slot.

use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::PrefixMap,
    types::{ClassDefinition, EnumDefinition, SchemaDefinition, SlotDefinition},
};
use indexmap::IndexSet;

/// LinkML name of the "anything goes" class
pub const LINKML_ANY: &str = "linkml:Any";

/// Built-in LinkML types the dumpers know how to encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `float`
    Float,
    /// `double` and `decimal`
    Double,
    /// `boolean`
    Boolean,
    /// `date`
    Date,
    /// `datetime`
    Datetime,
    /// `uri`
    Uri,
    /// `uriorcurie` and `curie`
    UriOrCurie,
}

impl BuiltinType {
    /// Look up a built-in type by LinkML name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name.strip_prefix("linkml:").unwrap_or(name) {
            "string" | "str" | "ncname" => Self::String,
            "integer" | "int" => Self::Integer,
            "float" => Self::Float,
            "double" | "decimal" => Self::Double,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::Datetime,
            "uri" => Self::Uri,
            "uriorcurie" | "curie" => Self::UriOrCurie,
            _ => return None,
        };
        Some(builtin)
    }

    /// XML Schema datatype IRI for literals of this type
    #[must_use]
    pub fn xsd_iri(self) -> &'static str {
        match self {
            Self::String => "http://www.w3.org/2001/XMLSchema#string",
            Self::Integer => "http://www.w3.org/2001/XMLSchema#integer",
            Self::Float => "http://www.w3.org/2001/XMLSchema#float",
            Self::Double => "http://www.w3.org/2001/XMLSchema#double",
            Self::Boolean => "http://www.w3.org/2001/XMLSchema#boolean",
            Self::Date => "http://www.w3.org/2001/XMLSchema#date",
            Self::Datetime => "http://www.w3.org/2001/XMLSchema#dateTime",
            Self::Uri | Self::UriOrCurie => "http://www.w3.org/2001/XMLSchema#anyURI",
        }
    }
}

/// What a slot range refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeKind {
    /// A built-in type, possibly through user-defined `typeof` chains
    Type {
        /// The built-in at the end of the chain
        builtin: BuiltinType,
        /// Pattern inherited from the type definitions
        pattern: Option<String>,
    },
    /// A class
    Class(String),
    /// An enum
    Enum(String),
    /// Any JSON value
    Any,
}

/// Read-only view answering induced-schema questions
#[derive(Debug, Clone)]
pub struct SchemaView {
    schema: SchemaDefinition,
    prefixes: PrefixMap,
}

impl SchemaView {
    /// Wrap a schema
    #[must_use]
    pub fn new(mut schema: SchemaDefinition) -> Self {
        schema.normalize_names();
        let prefixes = PrefixMap::from_schema(&schema);
        Self { schema, prefixes }
    }

    /// The underlying schema
    #[must_use]
    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Prefixes declared by the schema
    #[must_use]
    pub fn prefix_map(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Prefix for elements without an explicit URI
    #[must_use]
    pub fn default_prefix(&self) -> &str {
        self.schema
            .default_prefix
            .as_deref()
            .unwrap_or(&self.schema.name)
    }

    /// Class by name
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` for unknown classes.
    pub fn get_class(&self, name: &str) -> Result<&ClassDefinition> {
        self.schema
            .classes
            .get(name)
            .ok_or_else(|| LinkMLError::missing_class(name))
    }

    /// Enum by name
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&EnumDefinition> {
        self.schema.enums.get(name)
    }

    /// The class marked `tree_root`, if any
    #[must_use]
    pub fn tree_root(&self) -> Option<&ClassDefinition> {
        self.schema.classes.values().find(|c| c.tree_root)
    }

    /// `name` followed by its `is_a` ancestors and mixins, nearest first
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` when any class in the chain is
    /// unknown.
    pub fn class_ancestors(&self, name: &str) -> Result<Vec<String>> {
        let mut seen: IndexSet<String> = IndexSet::new();
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let class = self.get_class(&current)?;
            // pushed in reverse so is_a is visited before mixins
            for mixin in class.mixins.iter().rev() {
                pending.push(mixin.clone());
            }
            if let Some(parent) = &class.is_a {
                pending.push(parent.clone());
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Names of every slot a class has, own slots first
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` for unknown classes.
    pub fn class_slots(&self, class_name: &str) -> Result<Vec<String>> {
        let mut names: IndexSet<String> = IndexSet::new();
        for ancestor in self.class_ancestors(class_name)? {
            let class = self.get_class(&ancestor)?;
            names.extend(class.slots.iter().cloned());
            names.extend(class.attributes.keys().cloned());
        }
        Ok(names.into_iter().collect())
    }

    /// Effective definition of `slot_name` as used by `class_name`
    ///
    /// The top-level slot is refined by each ancestor's attribute and
    /// `slot_usage`, most general ancestor first. A missing range falls
    /// back to the schema's `default_range`, then `string`.
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` when the class is unknown or the
    /// slot is defined nowhere.
    pub fn induced_slot(&self, slot_name: &str, class_name: &str) -> Result<SlotDefinition> {
        let ancestors = self.class_ancestors(class_name)?;
        let mut found = self.schema.slots.contains_key(slot_name);
        let mut slot = self
            .schema
            .slots
            .get(slot_name)
            .cloned()
            .unwrap_or_default();

        for ancestor in ancestors.iter().rev() {
            let class = self.get_class(ancestor)?;
            if let Some(attribute) = class.attributes.get(slot_name) {
                slot.apply(attribute);
                found = true;
            }
            if let Some(usage) = class.slot_usage.get(slot_name) {
                slot.apply(usage);
            }
        }

        if !found {
            return Err(LinkMLError::missing_slot(format!("{class_name}.{slot_name}")));
        }
        slot.name = slot_name.to_string();
        if slot.range.is_none() {
            slot.range = Some(
                self.schema
                    .default_range
                    .clone()
                    .unwrap_or_else(|| "string".to_string()),
            );
        }
        Ok(slot)
    }

    /// Effective definitions of every slot of a class
    ///
    /// # Errors
    ///
    /// As [`SchemaView::induced_slot`].
    pub fn induced_slots(&self, class_name: &str) -> Result<Vec<SlotDefinition>> {
        self.class_slots(class_name)?
            .iter()
            .map(|name| self.induced_slot(name, class_name))
            .collect()
    }

    /// The identifier slot of a class, if it has one
    ///
    /// # Errors
    ///
    /// As [`SchemaView::induced_slots`].
    pub fn identifier_slot(&self, class_name: &str) -> Result<Option<SlotDefinition>> {
        Ok(self
            .induced_slots(class_name)?
            .into_iter()
            .find(SlotDefinition::is_identifier))
    }

    /// CURIE or IRI of a class
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` for unknown classes.
    pub fn class_uri(&self, class_name: &str) -> Result<String> {
        let class = self.get_class(class_name)?;
        Ok(class
            .class_uri
            .clone()
            .unwrap_or_else(|| format!("{}:{class_name}", self.default_prefix())))
    }

    /// CURIE or IRI of a slot
    #[must_use]
    pub fn slot_uri(&self, slot: &SlotDefinition) -> String {
        slot.slot_uri
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.default_prefix(), slot.name))
    }

    /// Expand a CURIE through the schema prefixes
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::UnknownPrefix` for undeclared prefixes.
    pub fn expand_curie(&self, curie: &str) -> Result<String> {
        self.prefixes.expand(curie, Some(self.default_prefix()))
    }

    /// Classify a range name
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::MissingElement` when the name is not a class,
    /// enum or type, or when a `typeof` chain does not end in a built-in.
    pub fn range_kind(&self, range: &str) -> Result<RangeKind> {
        if let Some(class) = self.schema.classes.get(range) {
            if class.class_uri.as_deref() == Some(LINKML_ANY) {
                return Ok(RangeKind::Any);
            }
            return Ok(RangeKind::Class(range.to_string()));
        }
        if range == "Any" || range == LINKML_ANY {
            return Ok(RangeKind::Any);
        }
        if self.schema.enums.contains_key(range) {
            return Ok(RangeKind::Enum(range.to_string()));
        }
        self.resolve_type(range)
    }

    /// Built-in type a slot's range ends in, if the range is a type
    ///
    /// # Errors
    ///
    /// As [`SchemaView::range_kind`].
    pub fn range_builtin(&self, slot: &SlotDefinition) -> Result<Option<BuiltinType>> {
        let range = slot.range.as_deref().unwrap_or("string");
        Ok(match self.range_kind(range)? {
            RangeKind::Type { builtin, .. } => Some(builtin),
            _ => None,
        })
    }

    /// Follow `typeof` until a built-in type
    fn resolve_type(&self, name: &str) -> Result<RangeKind> {
        let mut current = name.to_string();
        let mut pattern = None;
        for _ in 0..=self.schema.types.len() {
            if let Some(type_def) = self.schema.types.get(&current) {
                if pattern.is_none() {
                    pattern.clone_from(&type_def.pattern);
                }
                match type_def.typeof_.as_ref().or(type_def.base.as_ref()) {
                    Some(parent) => {
                        current.clone_from(parent);
                        continue;
                    }
                    None => break,
                }
            }
            if let Some(builtin) = BuiltinType::from_name(&current) {
                return Ok(RangeKind::Type { builtin, pattern });
            }
            break;
        }
        Err(LinkMLError::MissingElement {
            kind: "type",
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_linkml_core::types::TypeDefinition;
    use pretty_assertions::assert_eq;

    fn view() -> SchemaView {
        let yaml = r#"
id: https://example.org/cas
name: cas
default_prefix: cas
default_range: string
prefixes:
  cas: https://example.org/cas/
  RO: http://purl.obolibrary.org/obo/RO_
slots:
  cell_label:
    description: Label of the cell set
classes:
  Named:
    mixin: true
    attributes:
      name: {}
  Annotation:
    slots: [cell_label]
    attributes:
      cell_set_accession:
        identifier: true
      parent_cell_set_accession:
        range: Annotation
        slot_uri: RO:0015003
  ReviewedAnnotation:
    is_a: Annotation
    mixins: [Named]
    slot_usage:
      cell_label:
        required: true
  Any:
    class_uri: linkml:Any
enums:
  Cell_type:
    reachable_from:
      source_nodes: [CL:0000000]
types:
  Accession:
    typeof: string
    pattern: "^CS[0-9]+$"
"#;
        let schema: SchemaDefinition = serde_yaml::from_str(yaml).unwrap();
        SchemaView::new(schema)
    }

    #[test]
    fn test_ancestors_nearest_first() {
        assert_eq!(
            view().class_ancestors("ReviewedAnnotation").unwrap(),
            vec!["ReviewedAnnotation", "Annotation", "Named"]
        );
    }

    #[test]
    fn test_class_slots_include_inherited() {
        assert_eq!(
            view().class_slots("ReviewedAnnotation").unwrap(),
            vec![
                "cell_label",
                "cell_set_accession",
                "parent_cell_set_accession",
                "name"
            ]
        );
    }

    #[test]
    fn test_slot_usage_refines_top_level_slot() {
        let view = view();
        let plain = view.induced_slot("cell_label", "Annotation").unwrap();
        assert!(!plain.is_required());
        let refined = view.induced_slot("cell_label", "ReviewedAnnotation").unwrap();
        assert!(refined.is_required());
        assert_eq!(refined.range.as_deref(), Some("string"));
        assert_eq!(
            refined.description.as_deref(),
            Some("Label of the cell set")
        );
    }

    #[test]
    fn test_identifier_slot() {
        let slot = view().identifier_slot("ReviewedAnnotation").unwrap().unwrap();
        assert_eq!(slot.name, "cell_set_accession");
    }

    #[test]
    fn test_uris() {
        let view = view();
        assert_eq!(view.class_uri("Annotation").unwrap(), "cas:Annotation");
        let parent = view
            .induced_slot("parent_cell_set_accession", "Annotation")
            .unwrap();
        assert_eq!(view.slot_uri(&parent), "RO:0015003");
        assert_eq!(
            view.expand_curie(&view.slot_uri(&parent)).unwrap(),
            "http://purl.obolibrary.org/obo/RO_0015003"
        );
    }

    #[test]
    fn test_range_kinds() {
        let view = view();
        assert_eq!(
            view.range_kind("Annotation").unwrap(),
            RangeKind::Class("Annotation".to_string())
        );
        assert_eq!(
            view.range_kind("Cell_type").unwrap(),
            RangeKind::Enum("Cell_type".to_string())
        );
        assert_eq!(view.range_kind("Any").unwrap(), RangeKind::Any);
        assert_eq!(
            view.range_kind("Accession").unwrap(),
            RangeKind::Type {
                builtin: BuiltinType::String,
                pattern: Some("^CS[0-9]+$".to_string())
            }
        );
        assert!(view.range_kind("Nothing").is_err());
    }

    #[test]
    fn test_type_cycle_is_an_error() {
        let mut schema = view().schema().clone();
        for (name, parent) in [("A", "B"), ("B", "A")] {
            schema.types.insert(
                name.to_string(),
                TypeDefinition {
                    name: name.to_string(),
                    typeof_: Some(parent.to_string()),
                    ..TypeDefinition::default()
                },
            );
        }
        assert!(SchemaView::new(schema).range_kind("A").is_err());
    }

    #[test]
    fn test_unknown_slot() {
        let err = view().induced_slot("nope", "Annotation").unwrap_err();
        assert!(matches!(err, LinkMLError::MissingElement { kind: "slot", .. }));
    }
}
