//! Ontology service backed by a local term file
//!
//! ```yaml
//! terms:
//!   - id: CL:0000540
//!     label: neuron
//!     parents: [CL:0000000]
//!     relations:
//!       BFO:0000050: [UBERON:0000955]
//! ```
//!
//! `parents` are subclass edges; `relations` are other hierarchical edges,
//! only followed by hierarchical traversals.

use async_trait::async_trait;
use cas_linkml_core::{error::Result, prefixes::PrefixMap};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{Direction, OntologyService, OntologyTerm, TraversalQuery};

#[derive(Debug, Deserialize)]
struct TermFile {
    #[serde(default)]
    terms: Vec<TermEntry>,
}

#[derive(Debug, Deserialize)]
struct TermEntry {
    id: String,
    #[serde(default)]
    iri: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    relations: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct Edges {
    subclass: Vec<String>,
    other: Vec<String>,
}

/// In-memory ontology loaded from YAML
#[derive(Debug, Default)]
pub struct LocalOntology {
    /// Terms by IRI
    terms: IndexMap<String, OntologyTerm>,
    /// IRI to superclass / related IRIs
    up: HashMap<String, Edges>,
    /// IRI to subclass / related IRIs
    down: HashMap<String, Edges>,
}

impl LocalOntology {
    /// Parse a term file, expanding CURIEs through `prefixes`
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed YAML and
    /// `LinkMLError::UnknownPrefix` for CURIEs `prefixes` cannot expand.
    pub fn from_yaml_str(content: &str, prefixes: &PrefixMap) -> Result<Self> {
        let file: TermFile = serde_yaml::from_str(content)?;
        let mut ontology = Self::default();

        for entry in file.terms {
            let iri = match &entry.iri {
                Some(iri) => iri.clone(),
                None => prefixes.expand(&entry.id, None)?,
            };
            for parent in &entry.parents {
                let parent_iri = prefixes.expand(parent, None)?;
                ontology.add_edge(&iri, &parent_iri, true);
            }
            for targets in entry.relations.values() {
                for target in targets {
                    let target_iri = prefixes.expand(target, None)?;
                    ontology.add_edge(&iri, &target_iri, false);
                }
            }
            ontology.terms.insert(
                iri.clone(),
                OntologyTerm {
                    iri,
                    curie: Some(entry.id),
                    label: entry.label,
                },
            );
        }

        tracing::debug!(terms = ontology.terms.len(), "loaded local ontology");
        Ok(ontology)
    }

    /// Number of terms
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the file declared no terms
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn add_edge(&mut self, child: &str, parent: &str, subclass: bool) {
        let up = self.up.entry(child.to_string()).or_default();
        let down = self.down.entry(parent.to_string()).or_default();
        if subclass {
            up.subclass.push(parent.to_string());
            down.subclass.push(child.to_string());
        } else {
            up.other.push(parent.to_string());
            down.other.push(child.to_string());
        }
    }

    fn neighbours<'a>(&'a self, iri: &str, query: &TraversalQuery) -> Vec<&'a str> {
        let index = match query.direction {
            Direction::Descendants => &self.down,
            Direction::Ancestors => &self.up,
        };
        let Some(edges) = index.get(iri) else {
            return Vec::new();
        };
        let mut found: Vec<&str> = edges.subclass.iter().map(String::as_str).collect();
        if query.hierarchical {
            found.extend(edges.other.iter().map(String::as_str));
        }
        found
    }

    fn term_or_bare(&self, iri: &str) -> OntologyTerm {
        self.terms.get(iri).cloned().unwrap_or_else(|| OntologyTerm {
            iri: iri.to_string(),
            curie: None,
            label: None,
        })
    }
}

#[async_trait]
impl OntologyService for LocalOntology {
    async fn traverse(&self, query: &TraversalQuery) -> Result<Vec<OntologyTerm>> {
        if !self.terms.contains_key(&query.node_iri) && !self.down.contains_key(&query.node_iri) {
            tracing::warn!(node = %query.node, "start node not in local ontology");
            return Ok(Vec::new());
        }

        let mut seen: HashSet<&str> = HashSet::from([query.node_iri.as_str()]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(query.node_iri.as_str(), 0)]);
        let mut reached = Vec::new();

        while let Some((iri, depth)) = queue.pop_front() {
            if query.direct_only && depth == 1 {
                continue;
            }
            for next in self.neighbours(iri, query) {
                if seen.insert(next) {
                    reached.push(self.term_or_bare(next));
                    queue.push_back((next, depth + 1));
                }
            }
        }

        Ok(reached)
    }

    async fn lookup(&self, _ontology: &str, iri: &str) -> Result<Option<OntologyTerm>> {
        Ok(self.terms.get(iri).cloned())
    }
}
