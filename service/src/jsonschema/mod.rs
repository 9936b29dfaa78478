//! JSON-Schema to LinkML import
//!
//! Translates a JSON-Schema document, such as the Cell Annotation Schema,
//! into a LinkML [`SchemaDefinition`]:
//!
//! - `definitions` / `$defs` objects become classes, `enum` lists become
//!   enums and constrained scalars become types
//! - the root object becomes the tree-root class
//! - properties become class attributes, with `$ref` ranges, `array` mapped
//!   to `multivalued` and nested objects lifted into their own classes

use cas_linkml_core::{
    error::{LinkMLError, Result},
    types::{
        AnonymousSlotExpression, ClassDefinition, EnumDefinition, PermissibleValue,
        PrefixDefinition, SchemaDefinition, SlotDefinition, TypeDefinition,
    },
};
use convert_case::{Case, Casing};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Range used for free-form JSON objects
pub const ANY_CLASS: &str = "Any";

/// Kind of a named definition, known before translation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionKind {
    Class,
    Enum,
    Type,
}

/// A resolved range for a property or array item
#[derive(Debug, Clone)]
struct RangeSpec {
    range: Option<String>,
    any_of: Vec<AnonymousSlotExpression>,
    is_class: bool,
}

impl RangeSpec {
    fn scalar(range: &str) -> Self {
        Self {
            range: Some(range.to_string()),
            any_of: Vec::new(),
            is_class: false,
        }
    }

    fn class(range: String) -> Self {
        Self {
            range: Some(range),
            any_of: Vec::new(),
            is_class: true,
        }
    }
}

/// Imports JSON-Schema documents as LinkML schemas
#[derive(Debug, Default)]
pub struct JsonSchemaImporter {
    /// Kinds of the named definitions in the document being imported
    kinds: HashMap<String, DefinitionKind>,
    /// Schema under construction
    schema: SchemaDefinition,
}

impl JsonSchemaImporter {
    /// Create an importer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a JSON-Schema given as text
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON, otherwise as
    /// [`JsonSchemaImporter::import`].
    pub fn import_str(
        self,
        content: &str,
        name: &str,
        root_class_name: Option<&str>,
    ) -> Result<SchemaDefinition> {
        let document: Value = serde_json::from_str(content)?;
        self.import(&document, name, root_class_name)
    }

    /// Import a parsed JSON-Schema document
    ///
    /// The root class is named `root_class_name`, or the PascalCased `title`
    /// of the document, or the PascalCased `name`.
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::SchemaValidation` for documents that are not
    /// objects, dangling or external `$ref`s and malformed keywords.
    pub fn import(
        mut self,
        document: &Value,
        name: &str,
        root_class_name: Option<&str>,
    ) -> Result<SchemaDefinition> {
        let root = document
            .as_object()
            .ok_or_else(|| LinkMLError::schema("JSON-Schema document must be an object"))?;

        self.init_schema(root, name);

        let definitions = collect_definitions(root);
        for (def_name, def) in &definitions {
            self.kinds.insert(def_name.clone(), classify(def));
        }

        for (def_name, def) in &definitions {
            self.translate_definition(def_name, def)?;
        }

        let root_name = root_class_name.map_or_else(
            || {
                root.get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(name)
                    .to_case(Case::Pascal)
            },
            str::to_string,
        );
        let mut root_class = self.translate_object(&root_name, root)?;
        root_class.tree_root = true;
        self.insert_class(&root_name, root_class);

        tracing::info!(
            name = %self.schema.name,
            root = %root_name,
            classes = self.schema.classes.len(),
            enums = self.schema.enums.len(),
            "imported JSON-Schema"
        );
        Ok(self.schema)
    }

    fn init_schema(&mut self, root: &Map<String, Value>, name: &str) {
        let id = format!("https://w3id.org/{name}");
        let mut schema = SchemaDefinition::new(id.clone(), name);
        schema.title = root.get("title").and_then(Value::as_str).map(str::to_string);
        schema.description = root
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        schema.version = root.get("version").and_then(Value::as_str).map(str::to_string);
        schema.default_prefix = Some(name.to_string());
        schema.default_range = Some("string".to_string());
        schema.imports.push("linkml:types".to_string());
        schema.prefixes.insert(
            "linkml".to_string(),
            PrefixDefinition::from("https://w3id.org/linkml/"),
        );
        schema
            .prefixes
            .insert(name.to_string(), PrefixDefinition::from(format!("{id}/")));
        self.schema = schema;
    }

    fn translate_definition(&mut self, def_name: &str, def: &Value) -> Result<()> {
        let obj = def.as_object().ok_or_else(|| {
            LinkMLError::schema(format!("definition '{def_name}' must be an object"))
        })?;
        match self.kinds.get(def_name).copied() {
            Some(DefinitionKind::Enum) => {
                let enum_def = translate_enum(def_name, obj)?;
                self.schema.enums.insert(def_name.to_string(), enum_def);
            }
            Some(DefinitionKind::Type) => {
                let type_def = TypeDefinition {
                    name: def_name.to_string(),
                    typeof_: Some(scalar_range(obj).to_string()),
                    description: description(obj),
                    pattern: obj.get("pattern").and_then(Value::as_str).map(str::to_string),
                    ..TypeDefinition::default()
                };
                self.schema.types.insert(def_name.to_string(), type_def);
            }
            Some(DefinitionKind::Class) | None => {
                let class = self.translate_object(def_name, obj)?;
                self.insert_class(def_name, class);
            }
        }
        Ok(())
    }

    fn insert_class(&mut self, name: &str, class: ClassDefinition) {
        // nested classes are inserted while translating their parent;
        // keep the parent ahead of them in the output
        if let Some(index) = self.schema.classes.get_index_of(name) {
            self.schema.classes.shift_remove_index(index);
        }
        self.schema.classes.insert(name.to_string(), class);
    }

    fn translate_object(
        &mut self,
        class_name: &str,
        obj: &Map<String, Value>,
    ) -> Result<ClassDefinition> {
        let mut class = ClassDefinition {
            name: class_name.to_string(),
            description: description(obj),
            ..ClassDefinition::default()
        };

        if let Some(Value::Array(all_of)) = obj.get("allOf") {
            let parents: Vec<String> = all_of
                .iter()
                .filter_map(|v| v.get("$ref").and_then(Value::as_str))
                .map(ref_name)
                .collect::<Result<_>>()?;
            let mut parents = parents.into_iter();
            class.is_a = parents.next();
            class.mixins.extend(parents);
        }

        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if let Some(properties) = obj.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                LinkMLError::schema(format!("'properties' of {class_name} must be an object"))
            })?;
            for (prop_name, prop) in properties {
                let mut slot = self.translate_property(class_name, prop_name, prop)?;
                if required.contains(&prop_name.as_str()) {
                    slot.required = Some(true);
                }
                class.attributes.insert(prop_name.clone(), slot);
            }
        }

        Ok(class)
    }

    fn translate_property(
        &mut self,
        owner: &str,
        prop_name: &str,
        prop: &Value,
    ) -> Result<SlotDefinition> {
        let obj = prop.as_object().ok_or_else(|| {
            LinkMLError::schema(format!("property '{owner}.{prop_name}' must be an object"))
        })?;

        let mut slot = SlotDefinition {
            name: prop_name.to_string(),
            description: description(obj),
            pattern: obj.get("pattern").and_then(Value::as_str).map(str::to_string),
            minimum_value: obj.get("minimum").cloned(),
            maximum_value: obj.get("maximum").cloned(),
            ..SlotDefinition::default()
        };

        let spec = if json_type(obj) == Some("array") {
            slot.multivalued = Some(true);
            let items = obj.get("items").and_then(Value::as_object);
            match items {
                Some(items) => {
                    let spec = self.range_for(owner, prop_name, items)?;
                    if spec.is_class {
                        slot.inlined_as_list = Some(true);
                    }
                    if slot.pattern.is_none() {
                        slot.pattern = items.get("pattern").and_then(Value::as_str).map(str::to_string);
                    }
                    spec
                }
                None => RangeSpec::scalar("string"),
            }
        } else {
            self.range_for(owner, prop_name, obj)?
        };

        if spec.is_class {
            slot.inlined = Some(true);
        }
        slot.range = spec.range;
        slot.any_of = spec.any_of;
        Ok(slot)
    }

    fn range_for(
        &mut self,
        owner: &str,
        prop_name: &str,
        obj: &Map<String, Value>,
    ) -> Result<RangeSpec> {
        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let target = ref_name(reference)?;
            return match self.kinds.get(&target) {
                Some(DefinitionKind::Class) => Ok(RangeSpec::class(target)),
                Some(_) => Ok(RangeSpec {
                    range: Some(target),
                    any_of: Vec::new(),
                    is_class: false,
                }),
                None => Err(LinkMLError::schema(format!(
                    "'{owner}.{prop_name}' references undefined '{reference}'"
                ))),
            };
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(Value::Array(options)) = obj.get(keyword) {
                let mut any_of = Vec::new();
                let mut is_class = false;
                for option in options.iter().filter_map(Value::as_object) {
                    if json_type(option) == Some("null") {
                        continue;
                    }
                    let spec = self.range_for(owner, prop_name, option)?;
                    is_class |= spec.is_class;
                    any_of.push(AnonymousSlotExpression { range: spec.range });
                }
                if any_of.len() == 1 {
                    return Ok(RangeSpec {
                        range: any_of.remove(0).range,
                        any_of,
                        is_class,
                    });
                }
                return Ok(RangeSpec {
                    range: None,
                    any_of,
                    is_class,
                });
            }
        }

        if obj.contains_key("enum") {
            let enum_name = self.unique_enum_name(owner, prop_name);
            let mut enum_def = translate_enum(&enum_name, obj)?;
            enum_def
                .description
                .get_or_insert_with(|| format!("Values of {owner}.{prop_name}"));
            self.schema.enums.insert(enum_name.clone(), enum_def);
            return Ok(RangeSpec::scalar(&enum_name));
        }

        if json_type(obj) == Some("object") {
            if obj.contains_key("properties") {
                let class_name = self.unique_class_name(owner, prop_name);
                self.kinds.insert(class_name.clone(), DefinitionKind::Class);
                let class = self.translate_object(&class_name, obj)?;
                self.schema.classes.insert(class_name.clone(), class);
                return Ok(RangeSpec::class(class_name));
            }
            self.ensure_any_class();
            return Ok(RangeSpec {
                range: Some(ANY_CLASS.to_string()),
                any_of: Vec::new(),
                is_class: false,
            });
        }

        Ok(RangeSpec::scalar(scalar_range(obj)))
    }

    fn unique_enum_name(&self, owner: &str, prop_name: &str) -> String {
        let base = format!("{}Options", prop_name.to_case(Case::Pascal));
        if self.schema.enums.contains_key(&base) || self.kinds.contains_key(&base) {
            format!("{owner}{base}")
        } else {
            base
        }
    }

    fn unique_class_name(&self, owner: &str, prop_name: &str) -> String {
        let base = prop_name.to_case(Case::Pascal);
        if self.kinds.contains_key(&base) || self.schema.classes.contains_key(&base) {
            format!("{owner}{base}")
        } else {
            base
        }
    }

    fn ensure_any_class(&mut self) {
        self.schema
            .classes
            .entry(ANY_CLASS.to_string())
            .or_insert_with(|| ClassDefinition {
                name: ANY_CLASS.to_string(),
                class_uri: Some("linkml:Any".to_string()),
                description: Some("Free-form JSON object".to_string()),
                ..ClassDefinition::default()
            });
        self.kinds
            .insert(ANY_CLASS.to_string(), DefinitionKind::Type);
    }
}

/// Named definitions from both `definitions` and `$defs`, in document order
fn collect_definitions(root: &Map<String, Value>) -> Vec<(String, Value)> {
    ["definitions", "$defs"]
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_object))
        .flat_map(|defs| defs.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect()
}

fn classify(def: &Value) -> DefinitionKind {
    let Some(obj) = def.as_object() else {
        return DefinitionKind::Class;
    };
    if obj.contains_key("enum") {
        DefinitionKind::Enum
    } else if obj.contains_key("properties")
        || obj.contains_key("allOf")
        || json_type(obj) == Some("object")
        || json_type(obj).is_none()
    {
        DefinitionKind::Class
    } else {
        DefinitionKind::Type
    }
}

fn translate_enum(name: &str, obj: &Map<String, Value>) -> Result<EnumDefinition> {
    let values = obj
        .get("enum")
        .and_then(Value::as_array)
        .ok_or_else(|| LinkMLError::schema(format!("'enum' of {name} must be an array")))?;

    let mut enum_def = EnumDefinition {
        name: name.to_string(),
        description: description(obj),
        ..EnumDefinition::default()
    };
    for value in values {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => other.to_string(),
        };
        enum_def.permissible_values.insert(
            text.clone(),
            PermissibleValue {
                text,
                ..PermissibleValue::default()
            },
        );
    }
    Ok(enum_def)
}

/// Target definition name of a local `$ref`
fn ref_name(reference: &str) -> Result<String> {
    let local = reference
        .strip_prefix("#/definitions/")
        .or_else(|| reference.strip_prefix("#/$defs/"))
        .ok_or_else(|| {
            LinkMLError::schema(format!("unsupported $ref '{reference}': only local definitions are resolved"))
        })?;
    if local.is_empty() || local.contains('/') {
        return Err(LinkMLError::schema(format!("unsupported $ref '{reference}'")));
    }
    Ok(local.to_string())
}

/// The `type` keyword, skipping `null` in type unions
fn json_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// LinkML built-in type for a scalar JSON-Schema
fn scalar_range(obj: &Map<String, Value>) -> &'static str {
    let format = obj.get("format").and_then(Value::as_str);
    match (json_type(obj), format) {
        (Some("integer"), _) => "integer",
        (Some("number"), _) => "float",
        (Some("boolean"), _) => "boolean",
        (_, Some("date-time")) => "datetime",
        (_, Some("date")) => "date",
        (_, Some("uri" | "iri")) => "uri",
        (_, Some("uri-reference" | "iri-reference")) => "uriorcurie",
        _ => "string",
    }
}

fn description(obj: &Map<String, Value>) -> Option<String> {
    obj.get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cas_fragment() -> Value {
        json!({
            "title": "General Cell Annotation Open Standard",
            "description": "General, open-standard schema for cell annotations",
            "type": "object",
            "definitions": {
                "Labelset": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "rank": {"type": "integer", "minimum": 0},
                        "annotation_method": {"type": "string", "enum": ["algorithmic", "manual", "both"]}
                    },
                    "required": ["name"]
                },
                "Annotation": {
                    "type": "object",
                    "properties": {
                        "labelset": {"type": "string"},
                        "cell_label": {"type": "string"},
                        "cell_ontology_term_id": {"type": "string", "pattern": "^CL:[0-9]{7}$"},
                        "cell_ids": {"type": "array", "items": {"type": "string"}},
                        "author_annotation_fields": {"type": "object"},
                        "reviews": {"type": "array", "items": {"$ref": "#/definitions/Review"}}
                    },
                    "required": ["labelset", "cell_label"]
                },
                "Review": {
                    "type": "object",
                    "properties": {
                        "datestamp": {"type": "string", "format": "date-time"},
                        "review": {"type": "string", "enum": ["Agree", "Disagree"]}
                    }
                }
            },
            "properties": {
                "matrix_file_id": {"type": "string"},
                "labelsets": {"type": "array", "items": {"$ref": "#/definitions/Labelset"}},
                "annotations": {"type": "array", "items": {"$ref": "#/definitions/Annotation"}}
            },
            "required": ["labelsets", "annotations"]
        })
    }

    #[test]
    fn test_root_class_named_from_title() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cell-annotation-schema", None)
            .unwrap();
        let root = &schema.classes["GeneralCellAnnotationOpenStandard"];
        assert!(root.tree_root);
        assert_eq!(schema.id, "https://w3id.org/cell-annotation-schema");
        assert_eq!(schema.default_prefix.as_deref(), Some("cell-annotation-schema"));
        assert_eq!(schema.imports, vec!["linkml:types"]);
    }

    #[test]
    fn test_array_of_refs_is_inlined_list() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cas", None)
            .unwrap();
        let root = &schema.classes["GeneralCellAnnotationOpenStandard"];
        let labelsets = &root.attributes["labelsets"];
        assert_eq!(labelsets.range.as_deref(), Some("Labelset"));
        assert_eq!(labelsets.multivalued, Some(true));
        assert_eq!(labelsets.inlined_as_list, Some(true));
        assert_eq!(labelsets.required, Some(true));
    }

    #[test]
    fn test_scalar_mappings() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cas", None)
            .unwrap();
        let annotation = &schema.classes["Annotation"];
        assert_eq!(
            annotation.attributes["cell_ontology_term_id"].pattern.as_deref(),
            Some("^CL:[0-9]{7}$")
        );
        let cell_ids = &annotation.attributes["cell_ids"];
        assert_eq!(cell_ids.range.as_deref(), Some("string"));
        assert_eq!(cell_ids.multivalued, Some(true));
        assert_eq!(
            schema.classes["Review"].attributes["datestamp"].range.as_deref(),
            Some("datetime")
        );
        assert_eq!(
            schema.classes["Labelset"].attributes["rank"].minimum_value,
            Some(json!(0))
        );
    }

    #[test]
    fn test_inline_enums_become_named_enums() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cas", None)
            .unwrap();
        let method = &schema.classes["Labelset"].attributes["annotation_method"];
        assert_eq!(method.range.as_deref(), Some("AnnotationMethodOptions"));
        let values: Vec<&str> = schema.enums["AnnotationMethodOptions"]
            .permissible_values
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(values, vec!["algorithmic", "manual", "both"]);
        assert!(schema.enums.contains_key("ReviewOptions"));
        assert_eq!(
            schema.enums["ReviewOptions"].description.as_deref(),
            Some("Values of Review.review")
        );
    }

    #[test]
    fn test_inline_enum_keeps_its_description() {
        let doc = json!({
            "title": "Doc",
            "type": "object",
            "properties": {
                "cell_type_status": {
                    "type": "string",
                    "description": "Whether the cell type term was reviewed",
                    "enum": ["reviewed", "pending"]
                }
            }
        });
        let schema = JsonSchemaImporter::new().import(&doc, "doc", None).unwrap();
        let range = schema.classes["Doc"].attributes["cell_type_status"]
            .range
            .clone()
            .unwrap();
        assert_eq!(
            schema.enums[&range].description.as_deref(),
            Some("Whether the cell type term was reviewed")
        );
    }

    #[test]
    fn test_free_form_object_maps_to_any() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cas", None)
            .unwrap();
        let fields = &schema.classes["Annotation"].attributes["author_annotation_fields"];
        assert_eq!(fields.range.as_deref(), Some(ANY_CLASS));
        assert_eq!(
            schema.classes[ANY_CLASS].class_uri.as_deref(),
            Some("linkml:Any")
        );
    }

    #[test]
    fn test_explicit_root_class_name() {
        let schema = JsonSchemaImporter::new()
            .import(&cas_fragment(), "cas", Some("Taxonomy"))
            .unwrap();
        assert!(schema.classes["Taxonomy"].tree_root);
        assert!(!schema.classes.contains_key("GeneralCellAnnotationOpenStandard"));
    }

    #[test]
    fn test_nested_object_lifted_to_class() {
        let doc = json!({
            "title": "Doc",
            "properties": {
                "automated_annotation": {
                    "type": "object",
                    "properties": {"algorithm_name": {"type": "string"}}
                }
            }
        });
        let schema = JsonSchemaImporter::new().import(&doc, "doc", None).unwrap();
        let slot = &schema.classes["Doc"].attributes["automated_annotation"];
        assert_eq!(slot.range.as_deref(), Some("AutomatedAnnotation"));
        assert_eq!(slot.inlined, Some(true));
        assert!(schema.classes["AutomatedAnnotation"]
            .attributes
            .contains_key("algorithm_name"));
    }

    #[test]
    fn test_external_ref_rejected() {
        let doc = json!({
            "title": "Doc",
            "properties": {"x": {"$ref": "other.json#/definitions/X"}}
        });
        let err = JsonSchemaImporter::new().import(&doc, "doc", None).unwrap_err();
        assert!(matches!(err, LinkMLError::SchemaValidation(_)));
    }

    #[test]
    fn test_dangling_ref_rejected() {
        let doc = json!({
            "title": "Doc",
            "properties": {"x": {"$ref": "#/definitions/Missing"}}
        });
        assert!(JsonSchemaImporter::new().import(&doc, "doc", None).is_err());
    }
}
