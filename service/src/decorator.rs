//! Schema decoration
//!
//! Turns the schema imported from the CAS JSON-Schema into one bound to a
//! concrete taxonomy: its id and prefixes point at the taxonomy namespace,
//! cell-type and label-set enums become dynamic enums, and the slots named in
//! the [`DecorationProfile`] get their ontology URIs, ranges and identifier
//! flags.

use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::BASE_PREFIX,
    settings::{DecorationProfile, SlotOverride},
    types::{
        AnnotationValue, EnumDefinition, PrefixDefinition, ReachabilityQuery, SchemaDefinition,
        SlotDefinition,
    },
};

/// Relation followed by every enum the decorator declares
pub const SUBCLASS_OF: &str = "rdfs:subClassOf";

/// Annotation tag read by the OWL dumper
pub const OWL_ANNOTATION: &str = "owl";

/// Bind `schema` to a taxonomy namespace
///
/// Returns a new schema; `schema` is left untouched. Running the result
/// through this function again with the same arguments returns it unchanged.
///
/// # Errors
///
/// Returns `LinkMLError::MissingElement` when a slot named by the profile
/// exists neither in the top-level `slots` table nor in any class's
/// `attributes`, and `LinkMLError::MissingElement` for a class restriction
/// naming an unknown class.
pub fn decorate_linkml_schema(
    schema: &SchemaDefinition,
    namespace: &str,
    ontology_iri: &str,
    labelsets: &[String],
    profile: &DecorationProfile,
) -> Result<SchemaDefinition> {
    let mut decorated = schema.clone();
    decorated.id = ontology_iri.to_string();
    decorated.default_prefix = Some(namespace.to_string());

    add_prefixes(&mut decorated, namespace, ontology_iri, labelsets, profile);

    let cell_type = ReachabilityQuery {
        source_ontology: Some(profile.cell_type_ontology.clone()),
        source_nodes: vec![profile.cell_type_root.clone()],
        relationship_types: vec![SUBCLASS_OF.to_string()],
        is_direct: false,
        include_self: false,
        traverse_up: false,
    };
    declare_dynamic_enum(&mut decorated, &profile.cell_type_enum, cell_type);

    for labelset in labelsets {
        let query = ReachabilityQuery {
            source_ontology: Some(format!("{namespace}:{labelset}")),
            source_nodes: vec![format!("{namespace}:{labelset}")],
            relationship_types: vec![SUBCLASS_OF.to_string()],
            is_direct: true,
            include_self: false,
            traverse_up: false,
        };
        declare_dynamic_enum(&mut decorated, labelset, query);
    }

    for (slot_name, slot_override) in &profile.slot_overrides {
        apply_override(&mut decorated, slot_name, slot_override)?;
    }

    tracing::info!(
        namespace,
        ontology_iri,
        labelsets = labelsets.len(),
        overrides = profile.slot_overrides.len(),
        "decorated schema"
    );
    Ok(decorated)
}

/// Add the `owl` annotations the OWL dumper reads
///
/// Each class in `profile.owl_classes` is marked `owl: Class`; each slot in
/// `profile.owl_slots` gets its axiom template, wherever that slot is
/// defined.
///
/// # Errors
///
/// Returns `LinkMLError::MissingElement` for unknown classes or slots.
pub fn decorate_for_owl(
    schema: &SchemaDefinition,
    profile: &DecorationProfile,
) -> Result<SchemaDefinition> {
    let mut decorated = schema.clone();

    for class_name in &profile.owl_classes {
        let class = decorated
            .classes
            .get_mut(class_name)
            .ok_or_else(|| LinkMLError::missing_class(class_name))?;
        class
            .annotations
            .insert(OWL_ANNOTATION.to_string(), AnnotationValue::from("Class"));
    }

    for (slot_name, template) in &profile.owl_slots {
        let slots = find_slots(&mut decorated, slot_name, None)?;
        for slot in slots {
            slot.annotations.insert(
                OWL_ANNOTATION.to_string(),
                AnnotationValue::String(template.clone()),
            );
        }
    }

    tracing::debug!(
        classes = profile.owl_classes.len(),
        slots = profile.owl_slots.len(),
        "added OWL annotations"
    );
    Ok(decorated)
}

fn add_prefixes(
    schema: &mut SchemaDefinition,
    namespace: &str,
    ontology_iri: &str,
    labelsets: &[String],
    profile: &DecorationProfile,
) {
    let mut set = |prefix: &str, reference: String| {
        schema
            .prefixes
            .insert(prefix.to_string(), PrefixDefinition::from(reference));
    };

    for (prefix, reference) in &profile.base_prefixes {
        set(prefix, reference.clone());
    }
    set(namespace, ontology_iri.to_string());
    set(BASE_PREFIX, ontology_iri.to_string());
    for labelset in labelsets {
        set(labelset, format!("{ontology_iri}{labelset}#"));
    }
}

/// Declare `name` as a dynamic enum, keeping any values already expanded
fn declare_dynamic_enum(schema: &mut SchemaDefinition, name: &str, query: ReachabilityQuery) {
    let enum_def = schema
        .enums
        .entry(name.to_string())
        .or_insert_with(|| EnumDefinition {
            name: name.to_string(),
            ..EnumDefinition::default()
        });
    enum_def.reachable_from = Some(query);
}

fn apply_override(
    schema: &mut SchemaDefinition,
    slot_name: &str,
    slot_override: &SlotOverride,
) -> Result<()> {
    let slots = find_slots(schema, slot_name, slot_override.class.as_deref())?;
    for slot in slots {
        if let Some(slot_uri) = &slot_override.slot_uri {
            slot.slot_uri = Some(slot_uri.clone());
        }
        if let Some(range) = &slot_override.range {
            slot.range = Some(range.clone());
            // a scalar range swapped for a class or enum
            slot.any_of.clear();
        }
        if let Some(identifier) = slot_override.identifier {
            slot.identifier = Some(identifier);
        }
    }
    Ok(())
}

/// Every definition of `slot_name`: the top-level slot if there is one,
/// otherwise each class attribute of that name
fn find_slots<'a>(
    schema: &'a mut SchemaDefinition,
    slot_name: &str,
    class: Option<&str>,
) -> Result<Vec<&'a mut SlotDefinition>> {
    if let Some(class_name) = class {
        let class_def = schema
            .classes
            .get_mut(class_name)
            .ok_or_else(|| LinkMLError::missing_class(class_name))?;
        return class_def
            .attributes
            .get_mut(slot_name)
            .map(|slot| vec![slot])
            .ok_or_else(|| LinkMLError::missing_slot(format!("{class_name}.{slot_name}")));
    }

    if schema.slots.contains_key(slot_name) {
        return Ok(schema.slots.get_mut(slot_name).into_iter().collect());
    }

    let found: Vec<&mut SlotDefinition> = schema
        .classes
        .values_mut()
        .filter_map(|class_def| class_def.attributes.get_mut(slot_name))
        .collect();
    if found.is_empty() {
        Err(LinkMLError::missing_slot(slot_name))
    } else {
        Ok(found)
    }
}
