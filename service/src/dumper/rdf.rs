//! RDF graph construction and serialization

use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::{BASE_PREFIX, PrefixMap},
};
use oxrdf::{
    BlankNode, Graph, Literal, NamedNode, NamedNodeRef, Subject, Term, Triple,
    vocab::{rdf, xsd},
};
use oxrdfxml::RdfXmlSerializer;
use oxttl::TurtleSerializer;

use super::{RdfFormat, is_prefix_name};
use crate::instance::{InstanceObject, InstanceValue};
use crate::schema_view::{BuiltinType, SchemaView};

const RDF_JSON: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON");

/// Renders instance trees as RDF
///
/// IRIs are minted from the schema prefixes overlaid with the caller's
/// prefix map; identifiers without a prefix resolve against `_base`.
pub struct RdfDumper<'a> {
    view: &'a SchemaView,
    prefixes: PrefixMap,
}

impl<'a> RdfDumper<'a> {
    /// Dumper for instances of `view`'s schema
    #[must_use]
    pub fn new(view: &'a SchemaView, prefix_map: &PrefixMap) -> Self {
        let mut prefixes = view.prefix_map().clone();
        prefixes.extend(prefix_map);
        Self { view, prefixes }
    }

    /// Prefixes used for minting and declared on output
    #[must_use]
    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Build the graph for an instance tree
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::UnknownPrefix` for CURIEs no prefix expands,
    /// `LinkMLError::Serialization` for values that do not form valid IRIs
    /// and schema errors for slots the view cannot resolve.
    pub fn as_rdf_graph(&self, instance: &InstanceObject) -> Result<Graph> {
        let mut graph = Graph::new();
        self.add_object(&mut graph, instance)?;
        tracing::info!(
            class = %instance.class_name,
            triples = graph.len(),
            "built RDF graph"
        );
        Ok(graph)
    }

    /// Serialize a graph with the dumper's prefixes declared
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::Serialization` if the serializer fails.
    pub fn serialize(&self, graph: &Graph, format: RdfFormat) -> Result<String> {
        let bytes = match format {
            RdfFormat::Turtle => {
                let mut serializer = TurtleSerializer::new();
                for (prefix, namespace) in self.declarable_prefixes() {
                    serializer = serializer
                        .with_prefix(prefix, namespace)
                        .map_err(|e| LinkMLError::serialization(e.to_string()))?;
                }
                let mut writer = serializer.for_writer(Vec::new());
                for triple in graph {
                    writer.serialize_triple(triple)?;
                }
                writer.finish()?
            }
            RdfFormat::RdfXml => {
                let mut serializer = RdfXmlSerializer::new();
                for (prefix, namespace) in self.declarable_prefixes() {
                    serializer = serializer
                        .with_prefix(prefix, namespace)
                        .map_err(|e| LinkMLError::serialization(e.to_string()))?;
                }
                let mut writer = serializer.for_writer(Vec::new());
                for triple in graph {
                    writer.serialize_triple(triple)?;
                }
                writer.finish()?
            }
        };
        String::from_utf8(bytes).map_err(|e| LinkMLError::serialization(e.to_string()))
    }

    /// Prefixes whose names are legal in Turtle and XML
    fn declarable_prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .filter(|(prefix, _)| *prefix != BASE_PREFIX && is_prefix_name(prefix))
    }

    fn add_object(&self, graph: &mut Graph, object: &InstanceObject) -> Result<Subject> {
        let subject: Subject = match &object.identifier {
            Some(id) => self.named_node(id)?.into(),
            None => BlankNode::default().into(),
        };

        let class_iri = self.named_node(&self.view.class_uri(&object.class_name)?)?;
        graph.insert(&Triple::new(subject.clone(), rdf::TYPE, class_iri));

        for (slot_name, value) in &object.fields {
            let slot = self.view.induced_slot(slot_name, &object.class_name)?;
            let predicate = self.named_node(&self.view.slot_uri(&slot))?;
            let builtin = self.view.range_builtin(&slot)?;
            for item in value.items() {
                if let Some(term) = self.term(graph, item, builtin)? {
                    graph.insert(&Triple::new(subject.clone(), predicate.clone(), term));
                }
            }
        }
        Ok(subject)
    }

    /// RDF term for a value; `builtin` is the type the slot range ends in
    fn term(
        &self,
        graph: &mut Graph,
        value: &InstanceValue,
        builtin: Option<BuiltinType>,
    ) -> Result<Option<Term>> {
        let term: Term = match value {
            InstanceValue::Object(object) => self.add_object(graph, object)?.into(),
            InstanceValue::Reference { id, .. } => self.named_node(id)?.into(),
            InstanceValue::Enum {
                meaning: Some(meaning),
                ..
            } => self.named_node(meaning)?.into(),
            InstanceValue::Enum { text, meaning: None } => {
                Literal::new_simple_literal(text).into()
            }
            InstanceValue::Uri(uri) => self.named_node(uri)?.into(),
            InstanceValue::String(s) => Literal::new_simple_literal(s).into(),
            InstanceValue::Integer(i) => Literal::new_typed_literal(i.to_string(), xsd::INTEGER).into(),
            InstanceValue::Float(f) => {
                let datatype = if builtin == Some(BuiltinType::Float) {
                    xsd::FLOAT
                } else {
                    xsd::DOUBLE
                };
                Literal::new_typed_literal(f.to_string(), datatype).into()
            }
            InstanceValue::Boolean(b) => Literal::new_typed_literal(b.to_string(), xsd::BOOLEAN).into(),
            InstanceValue::Date(d) => Literal::new_typed_literal(d, xsd::DATE).into(),
            InstanceValue::Datetime(d) => Literal::new_typed_literal(d, xsd::DATE_TIME).into(),
            InstanceValue::Opaque(json) => Literal::new_typed_literal(json.to_string(), RDF_JSON).into(),
            InstanceValue::List(_) => return Ok(None),
        };
        Ok(Some(term))
    }

    fn named_node(&self, curie_or_iri: &str) -> Result<NamedNode> {
        let iri = self
            .prefixes
            .expand(curie_or_iri, Some(self.view.default_prefix()))?;
        NamedNode::new(iri.as_str())
            .map_err(|e| LinkMLError::serialization(format!("invalid IRI '{iri}': {e}")))
    }
}
