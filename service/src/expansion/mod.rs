//! Value-set expansion
//!
//! Dynamic enums carry a `reachable_from` query instead of a value list.
//! [`ValueSetExpander`] runs those queries against an [`OntologyService`] and
//! materialises the results as permissible values whose `meaning` is the
//! term CURIE.
//!
//! Two services are provided: [`OlsClient`] for the EBI Ontology Lookup
//! Service and [`LocalOntology`] for a term file on disk.

use async_trait::async_trait;
use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::PrefixMap,
    settings::ExpansionSettings,
    types::{EnumDefinition, PermissibleValue, ReachabilityQuery, SchemaDefinition},
};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

pub mod local;
pub mod ols;

pub use local::LocalOntology;
pub use ols::OlsClient;

const RDFS_SUBCLASS_OF: [&str; 2] = [
    "rdfs:subClassOf",
    "http://www.w3.org/2000/01/rdf-schema#subClassOf",
];

/// A term returned by an ontology service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyTerm {
    /// Full IRI
    pub iri: String,
    /// CURIE, when the service knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curie: Option<String>,
    /// Preferred label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Which way to walk from the start node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Subclasses
    Descendants,
    /// Superclasses
    Ancestors,
}

/// One traversal from one start node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraversalQuery {
    /// Ontology to query, as written in `source_ontology`
    pub ontology: String,
    /// Start node CURIE
    pub node: String,
    /// Start node IRI
    pub node_iri: String,
    /// Walk direction
    pub direction: Direction,
    /// Stop after one step
    pub direct_only: bool,
    /// Follow hierarchical relations such as part-of besides subclass
    pub hierarchical: bool,
}

/// External ontology collaborator
#[async_trait]
pub trait OntologyService: Send + Sync {
    /// Terms reachable from the query's start node, excluding the node itself
    async fn traverse(&self, query: &TraversalQuery) -> Result<Vec<OntologyTerm>>;

    /// The term for `iri`, or `None` when the ontology does not know it
    async fn lookup(&self, ontology: &str, iri: &str) -> Result<Option<OntologyTerm>>;
}

/// What an expansion run changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    /// Number of permissible values added, per enum
    pub expanded: IndexMap<String, usize>,
    /// Enums that were asked for but have no `reachable_from`
    pub skipped: Vec<String>,
}

impl ExpansionReport {
    /// Permissible values added across all enums
    #[must_use]
    pub fn total_added(&self) -> usize {
        self.expanded.values().sum()
    }
}

/// Expands dynamic enums through an [`OntologyService`]
pub struct ValueSetExpander<S: OntologyService + ?Sized> {
    service: Arc<S>,
    labels_as_text: bool,
}

impl<S: OntologyService + ?Sized> ValueSetExpander<S> {
    /// Expander using term labels as permissible value text
    #[must_use]
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            labels_as_text: true,
        }
    }

    /// Expander configured from the `expansion` settings section
    #[must_use]
    pub fn from_settings(service: Arc<S>, settings: &ExpansionSettings) -> Self {
        Self::new(service).with_labels_as_text(settings.labels_as_text)
    }

    /// Use CURIEs rather than labels as permissible value text
    #[must_use]
    pub fn with_labels_as_text(mut self, labels_as_text: bool) -> Self {
        self.labels_as_text = labels_as_text;
        self
    }

    /// Expand the named enums of `schema` in place
    ///
    /// An empty `value_sets` expands every dynamic enum. Named enums without
    /// `reachable_from` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::UnknownValueSet` for a name that is not an enum
    /// of the schema (before anything is changed), and propagates service
    /// and prefix errors.
    pub async fn expand(
        &self,
        schema: &mut SchemaDefinition,
        value_sets: &[String],
    ) -> Result<ExpansionReport> {
        let names: Vec<String> = if value_sets.is_empty() {
            schema
                .enums
                .iter()
                .filter(|(_, e)| e.is_dynamic())
                .map(|(name, _)| name.clone())
                .collect()
        } else {
            if let Some(unknown) = value_sets.iter().find(|n| !schema.enums.contains_key(*n)) {
                return Err(LinkMLError::UnknownValueSet(unknown.clone()));
            }
            value_sets.to_vec()
        };

        let prefixes = PrefixMap::from_schema(schema);
        let default_prefix = schema.default_prefix.clone();
        let mut report = ExpansionReport::default();

        for name in names {
            let Some(enum_def) = schema.enums.get_mut(&name) else {
                continue;
            };
            let Some(query) = enum_def.reachable_from.clone() else {
                tracing::warn!(value_set = %name, "enum has no reachable_from; skipping");
                report.skipped.push(name);
                continue;
            };

            let terms = self
                .reachable_terms(&query, &prefixes, default_prefix.as_deref())
                .await?;
            let added = self.merge_terms(enum_def, terms);
            tracing::info!(value_set = %name, added, "expanded value set");
            report.expanded.insert(name, added);
        }

        Ok(report)
    }

    /// Every term the query reaches, keyed and sorted by CURIE
    async fn reachable_terms(
        &self,
        query: &ReachabilityQuery,
        prefixes: &PrefixMap,
        default_prefix: Option<&str>,
    ) -> Result<BTreeMap<String, OntologyTerm>> {
        let ontology = query.source_ontology.clone().unwrap_or_default();
        let hierarchical = query
            .relationship_types
            .iter()
            .any(|rt| !RDFS_SUBCLASS_OF.contains(&rt.as_str()));
        let direction = if query.traverse_up {
            Direction::Ancestors
        } else {
            Direction::Descendants
        };

        let traversals = query
            .source_nodes
            .iter()
            .map(|node| {
                Ok(TraversalQuery {
                    ontology: ontology.clone(),
                    node: node.clone(),
                    node_iri: prefixes.expand(node, default_prefix)?,
                    direction,
                    direct_only: query.is_direct,
                    hierarchical,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let results = try_join_all(traversals.iter().map(|t| self.service.traverse(t))).await?;
        let mut terms: Vec<OntologyTerm> = results.into_iter().flatten().collect();

        if query.include_self {
            let selves = try_join_all(
                traversals
                    .iter()
                    .map(|t| self.service.lookup(&t.ontology, &t.node_iri)),
            )
            .await?;
            for (traversal, found) in traversals.iter().zip(selves) {
                terms.push(found.unwrap_or_else(|| OntologyTerm {
                    iri: traversal.node_iri.clone(),
                    curie: Some(traversal.node.clone()),
                    label: None,
                }));
            }
        }

        Ok(terms
            .into_iter()
            .map(|term| (term_curie(&term, prefixes), term))
            .collect())
    }

    /// Add `terms` as permissible values, returning how many were new
    fn merge_terms(
        &self,
        enum_def: &mut EnumDefinition,
        terms: BTreeMap<String, OntologyTerm>,
    ) -> usize {
        let known_meanings: HashSet<String> = enum_def
            .permissible_values
            .values()
            .filter_map(|pv| pv.meaning.clone())
            .collect();
        let terms: Vec<(String, OntologyTerm)> = terms
            .into_iter()
            .filter(|(curie, _)| !known_meanings.contains(curie))
            .collect();

        let mut label_uses: HashMap<&str, usize> = HashMap::new();
        for label in terms.iter().filter_map(|(_, t)| t.label.as_deref()) {
            *label_uses.entry(label).or_default() += 1;
        }

        let mut added = Vec::new();
        for (curie, term) in &terms {
            let text = match term.label.as_deref() {
                Some(label)
                    if self.labels_as_text
                        && label_uses.get(label) == Some(&1)
                        && !enum_def.permissible_values.contains_key(label) =>
                {
                    label.to_string()
                }
                _ => curie.clone(),
            };
            if enum_def.permissible_values.contains_key(&text) {
                tracing::debug!(text = %text, "permissible value already present");
                continue;
            }
            added.push((
                text.clone(),
                PermissibleValue {
                    text,
                    description: term.label.clone(),
                    meaning: Some(curie.clone()),
                },
            ));
        }

        let count = added.len();
        enum_def.permissible_values.extend(added);
        count
    }
}

/// CURIE for a term: the service's own, else contracted, else the IRI
fn term_curie(term: &OntologyTerm, prefixes: &PrefixMap) -> String {
    term.curie
        .clone()
        .or_else(|| prefixes.contract(&term.iri))
        .unwrap_or_else(|| term.iri.clone())
}
