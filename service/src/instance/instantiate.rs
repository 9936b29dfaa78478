//! Schema-driven instantiation of JSON data

use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::is_absolute_iri,
    types::SlotDefinition,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::{InstanceObject, InstanceValue};
use crate::schema_view::{BuiltinType, RangeKind, SchemaView};

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex"));

static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("Invalid regex")
});

/// Instantiate `data` as an object of `target_class`
///
/// # Errors
///
/// Returns `LinkMLError::Instantiation` when the data does not conform:
/// unknown keys, missing required slots, wrong value types, values outside
/// a static enum, pattern and bound violations. The message names the path
/// of the offending value. Schema problems (unknown classes, invalid
/// patterns) surface as their own error kinds.
pub fn instantiate(view: &SchemaView, target_class: &str, data: &Value) -> Result<InstanceObject> {
    let mut instantiator = Instantiator {
        view,
        patterns: HashMap::new(),
    };
    let object = instantiator.object(target_class, data, "$")?;
    tracing::debug!(
        class = target_class,
        objects = object.walk().len(),
        "instantiated data"
    );
    Ok(object)
}

struct Instantiator<'a> {
    view: &'a SchemaView,
    patterns: HashMap<String, Regex>,
}

impl Instantiator<'_> {
    fn object(&mut self, class_name: &str, data: &Value, path: &str) -> Result<InstanceObject> {
        let Value::Object(map) = data else {
            return Err(fail(class_name, path, "expected an object"));
        };
        let class = self.view.get_class(class_name)?;
        if class.abstract_ {
            return Err(fail(class_name, path, "class is abstract"));
        }

        let slots = self.view.induced_slots(class_name)?;
        if let Some(unknown) = map
            .keys()
            .find(|key| !slots.iter().any(|slot| &slot.name == *key))
        {
            return Err(fail(class_name, path, &format!("unknown slot '{unknown}'")));
        }

        let mut object = InstanceObject::new(class_name);
        for slot in &slots {
            let slot_path = format!("{path}.{}", slot.name);
            match map.get(&slot.name) {
                None | Some(Value::Null) => {
                    if slot.is_required() {
                        return Err(fail(
                            class_name,
                            path,
                            &format!("missing required slot '{}'", slot.name),
                        ));
                    }
                }
                Some(value) => {
                    let converted = self.slot_value(class_name, slot, value, &slot_path)?;
                    if slot.is_identifier() {
                        object.identifier = converted.as_text();
                    }
                    object.fields.insert(slot.name.clone(), converted);
                }
            }
        }
        Ok(object)
    }

    fn slot_value(
        &mut self,
        owner: &str,
        slot: &SlotDefinition,
        value: &Value,
        path: &str,
    ) -> Result<InstanceValue> {
        if !slot.is_multivalued() {
            if value.is_array() {
                return Err(fail(owner, path, "expected a single value"));
            }
            return self.single(owner, slot, value, path);
        }

        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.single(owner, slot, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>>>()
                .map(InstanceValue::List),
            Value::Object(entries) if self.is_keyed_collection(slot)? => {
                self.keyed_collection(owner, slot, entries, path)
            }
            scalar => Ok(InstanceValue::List(vec![
                self.single(owner, slot, scalar, path)?,
            ])),
        }
    }

    /// Whether a multivalued class-valued slot may be written as a map keyed
    /// by identifier
    fn is_keyed_collection(&self, slot: &SlotDefinition) -> Result<bool> {
        let range = slot.range.as_deref().unwrap_or("string");
        match self.view.range_kind(range)? {
            RangeKind::Class(class) => Ok(self.view.identifier_slot(&class)?.is_some()),
            _ => Ok(false),
        }
    }

    fn keyed_collection(
        &mut self,
        owner: &str,
        slot: &SlotDefinition,
        entries: &Map<String, Value>,
        path: &str,
    ) -> Result<InstanceValue> {
        let range = slot.range.as_deref().unwrap_or("string");
        let id_slot = self
            .view
            .identifier_slot(range)?
            .ok_or_else(|| fail(owner, path, "range class has no identifier"))?;

        let mut items = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            let mut body = match entry {
                Value::Object(body) => body.clone(),
                Value::Null => Map::new(),
                _ => return Err(fail(owner, path, &format!("entry '{key}' must be an object"))),
            };
            body.entry(id_slot.name.clone())
                .or_insert_with(|| Value::String(key.clone()));
            let object = self.object(range, &Value::Object(body), &format!("{path}.{key}"))?;
            items.push(InstanceValue::Object(Box::new(object)));
        }
        Ok(InstanceValue::List(items))
    }

    fn single(
        &mut self,
        owner: &str,
        slot: &SlotDefinition,
        value: &Value,
        path: &str,
    ) -> Result<InstanceValue> {
        let range = slot.range.as_deref().unwrap_or("string");
        match self.view.range_kind(range)? {
            RangeKind::Any => Ok(InstanceValue::Opaque(value.clone())),
            RangeKind::Class(class) => self.class_value(owner, &class, value, path),
            RangeKind::Enum(enum_name) => self.enum_value(owner, &enum_name, value, path),
            RangeKind::Type { builtin, pattern } => {
                let pattern = slot.pattern.clone().or(pattern);
                self.typed_value(owner, slot, builtin, pattern.as_deref(), value, path)
            }
        }
    }

    fn class_value(
        &mut self,
        owner: &str,
        class: &str,
        value: &Value,
        path: &str,
    ) -> Result<InstanceValue> {
        match value {
            Value::Object(_) => Ok(InstanceValue::Object(Box::new(
                self.object(class, value, path)?,
            ))),
            Value::String(id) if self.view.identifier_slot(class)?.is_some() => {
                Ok(InstanceValue::Reference {
                    class: class.to_string(),
                    id: id.clone(),
                })
            }
            _ => Err(fail(
                owner,
                path,
                &format!("expected a {class} object or reference"),
            )),
        }
    }

    fn enum_value(
        &self,
        owner: &str,
        enum_name: &str,
        value: &Value,
        path: &str,
    ) -> Result<InstanceValue> {
        let Value::String(text) = value else {
            return Err(fail(owner, path, &format!("expected a {enum_name} value")));
        };
        let enum_def = self
            .view
            .get_enum(enum_name)
            .ok_or_else(|| LinkMLError::missing_enum(enum_name))?;

        let matched = enum_def.permissible_values.get(text).or_else(|| {
            enum_def
                .permissible_values
                .values()
                .find(|pv| pv.meaning.as_deref() == Some(text.as_str()))
        });
        if let Some(pv) = matched {
            return Ok(InstanceValue::Enum {
                text: pv.text.clone(),
                meaning: pv.meaning.clone(),
            });
        }

        if enum_def.permissible_values.is_empty() || enum_def.is_dynamic() {
            // open value set: a CURIE with a declared prefix is its own meaning
            let meaning = self
                .view
                .expand_curie(text)
                .ok()
                .filter(|_| text.contains(':'))
                .map(|_| text.clone());
            return Ok(InstanceValue::Enum {
                text: text.clone(),
                meaning,
            });
        }

        Err(fail(
            owner,
            path,
            &format!("'{text}' is not a permissible value of {enum_name}"),
        ))
    }

    fn typed_value(
        &mut self,
        owner: &str,
        slot: &SlotDefinition,
        builtin: BuiltinType,
        pattern: Option<&str>,
        value: &Value,
        path: &str,
    ) -> Result<InstanceValue> {
        let converted = match (builtin, value) {
            (BuiltinType::String, Value::String(s)) => InstanceValue::String(s.clone()),
            (BuiltinType::Integer, Value::Number(n)) => integral(n)
                .map(InstanceValue::Integer)
                .ok_or_else(|| fail(owner, path, "expected an integer"))?,
            (BuiltinType::Float | BuiltinType::Double, Value::Number(n)) => n
                .as_f64()
                .map(InstanceValue::Float)
                .ok_or_else(|| fail(owner, path, "expected a number"))?,
            (BuiltinType::Boolean, Value::Bool(b)) => InstanceValue::Boolean(*b),
            (BuiltinType::Date, Value::String(s)) if DATE.is_match(s) => {
                InstanceValue::Date(s.clone())
            }
            (BuiltinType::Datetime, Value::String(s)) if DATETIME.is_match(s) => {
                InstanceValue::Datetime(s.clone())
            }
            (BuiltinType::Uri, Value::String(s)) if is_absolute_iri(s) => {
                InstanceValue::Uri(s.clone())
            }
            (BuiltinType::UriOrCurie, Value::String(s)) => InstanceValue::Uri(s.clone()),
            _ => {
                return Err(fail(
                    owner,
                    path,
                    &format!("expected a {builtin:?} value, got {value}"),
                ));
            }
        };

        if let (Some(pattern), Value::String(s)) = (pattern, value) {
            if !self.pattern(pattern)?.is_match(s) {
                return Err(fail(
                    owner,
                    path,
                    &format!("'{s}' does not match pattern {pattern}"),
                ));
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = slot.minimum_value.as_ref().and_then(Value::as_f64) {
                if number < min {
                    return Err(fail(owner, path, &format!("{number} is below minimum {min}")));
                }
            }
            if let Some(max) = slot.maximum_value.as_ref().and_then(Value::as_f64) {
                if number > max {
                    return Err(fail(owner, path, &format!("{number} is above maximum {max}")));
                }
            }
        }

        Ok(converted)
    }

    fn pattern(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| {
                LinkMLError::schema(format!("invalid pattern '{pattern}': {e}"))
            })?;
            self.patterns.insert(pattern.to_string(), regex);
        }
        self.patterns
            .get(pattern)
            .ok_or_else(|| LinkMLError::schema(format!("pattern '{pattern}' not compiled")))
    }
}

/// Integer value of a JSON number; integral floats such as `2.0` count
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn fail(class: &str, path: &str, message: &str) -> LinkMLError {
    LinkMLError::instantiation(class, format!("{path}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_linkml_core::types::SchemaDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn view() -> SchemaView {
        let yaml = r#"
id: https://example.org/cas
name: cas
default_prefix: cas
prefixes:
  cas: https://example.org/cas/
  CL: http://purl.obolibrary.org/obo/CL_
classes:
  Taxonomy:
    tree_root: true
    attributes:
      title:
        required: true
      labelsets:
        range: Labelset
        multivalued: true
        inlined_as_list: true
      annotations:
        range: Annotation
        multivalued: true
        inlined_as_list: true
      extra:
        range: Any
  Labelset:
    attributes:
      name:
        identifier: true
      rank:
        range: integer
        minimum_value: 0
      annotation_method:
        range: AnnotationMethodOptions
  Annotation:
    attributes:
      cell_set_accession:
        identifier: true
      labelset:
        range: Labelset
      cell_label:
        required: true
      cell_ontology_term_id:
        range: Cell_type
      cell_ids:
        multivalued: true
      accession_date:
        range: date
      marker:
        pattern: "^[A-Z0-9]+$"
  Any:
    class_uri: linkml:Any
enums:
  AnnotationMethodOptions:
    permissible_values:
      algorithmic:
      manual:
  Cell_type:
    reachable_from:
      source_nodes: [CL:0000000]
"#;
        let schema: SchemaDefinition = serde_yaml::from_str(yaml).unwrap();
        SchemaView::new(schema)
    }

    fn data() -> Value {
        json!({
            "title": "MTG",
            "labelsets": [{"name": "Class", "rank": 2, "annotation_method": "manual"}],
            "annotations": [{
                "cell_set_accession": "CS202210140_1",
                "labelset": "Class",
                "cell_label": "Neuronal: GABAergic",
                "cell_ontology_term_id": "CL:0000617",
                "cell_ids": "cell-1",
                "accession_date": "2022-10-14"
            }],
            "extra": {"anything": [1, 2]}
        })
    }

    fn message(err: LinkMLError) -> String {
        match err {
            LinkMLError::Instantiation { message, .. } => message,
            other => panic!("expected an instantiation error, got {other}"),
        }
    }

    #[test]
    fn test_instantiates_tree() {
        let root = instantiate(&view(), "Taxonomy", &data()).unwrap();
        let annotations = root.get("annotations").unwrap().items();
        let InstanceValue::Object(annotation) = annotations[0] else {
            panic!("expected an inlined annotation");
        };
        assert_eq!(annotation.identifier.as_deref(), Some("CS202210140_1"));
        assert_eq!(
            annotation.get("labelset"),
            Some(&InstanceValue::Reference {
                class: "Labelset".to_string(),
                id: "Class".to_string()
            })
        );
        assert_eq!(
            annotation.get("cell_ontology_term_id"),
            Some(&InstanceValue::Enum {
                text: "CL:0000617".to_string(),
                meaning: Some("CL:0000617".to_string())
            })
        );
        assert_eq!(
            annotation.get("accession_date"),
            Some(&InstanceValue::Date("2022-10-14".to_string()))
        );
        assert!(matches!(root.get("extra"), Some(InstanceValue::Opaque(_))));
    }

    #[test]
    fn test_scalar_wrapped_for_multivalued() {
        let root = instantiate(&view(), "Taxonomy", &data()).unwrap();
        let InstanceValue::Object(annotation) = root.get("annotations").unwrap().items()[0] else {
            panic!("expected an inlined annotation");
        };
        assert_eq!(
            annotation.get("cell_ids"),
            Some(&InstanceValue::List(vec![InstanceValue::String(
                "cell-1".to_string()
            )]))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut data = data();
        data["bogus"] = json!(1);
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        assert!(message(err).contains("unknown slot 'bogus'"));
    }

    #[test]
    fn test_missing_required_slot() {
        let mut data = data();
        data["annotations"][0]
            .as_object_mut()
            .unwrap()
            .remove("cell_label");
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        let message = message(err);
        assert!(message.contains("$.annotations[0]"));
        assert!(message.contains("cell_label"));
    }

    #[test]
    fn test_static_enum_membership() {
        let mut data = data();
        data["labelsets"][0]["annotation_method"] = json!("guesswork");
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        assert!(message(err).contains("not a permissible value"));
    }

    #[test]
    fn test_minimum_value() {
        let mut data = data();
        data["labelsets"][0]["rank"] = json!(-1);
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        assert!(message(err).contains("below minimum"));
    }

    #[test]
    fn test_integral_float_accepted_as_integer() {
        let mut data = data();
        data["labelsets"][0]["rank"] = json!(2.0);
        let root = instantiate(&view(), "Taxonomy", &data).unwrap();
        let InstanceValue::Object(labelset) = root.get("labelsets").unwrap().items()[0] else {
            panic!("expected an inlined labelset");
        };
        assert_eq!(labelset.get("rank"), Some(&InstanceValue::Integer(2)));

        data["labelsets"][0]["rank"] = json!(2.5);
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        assert!(message(err).contains("expected an integer"));
    }

    #[test]
    fn test_wrong_scalar_type() {
        let mut data = data();
        data["labelsets"][0]["rank"] = json!("two");
        assert!(instantiate(&view(), "Taxonomy", &data).is_err());
    }

    #[test]
    fn test_pattern_violation() {
        let mut data = data();
        data["annotations"][0]["marker"] = json!("sst lower");
        let err = instantiate(&view(), "Taxonomy", &data).unwrap_err();
        assert!(message(err).contains("does not match pattern"));
    }

    #[test]
    fn test_bad_date() {
        let mut data = data();
        data["annotations"][0]["accession_date"] = json!("14/10/2022");
        assert!(instantiate(&view(), "Taxonomy", &data).is_err());
    }

    #[test]
    fn test_keyed_collection() {
        let mut data = data();
        data["labelsets"] = json!({"Class": {"rank": 2}, "Subclass": null});
        let root = instantiate(&view(), "Taxonomy", &data).unwrap();
        let ids: Vec<Option<String>> = root
            .get("labelsets")
            .unwrap()
            .items()
            .iter()
            .map(|v| match v {
                InstanceValue::Object(o) => o.identifier.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![Some("Class".to_string()), Some("Subclass".to_string())]);
    }

    #[test]
    fn test_document_must_be_object() {
        let err = instantiate(&view(), "Taxonomy", &json!([1, 2])).unwrap_err();
        assert!(message(err).contains("expected an object"));
    }
}
