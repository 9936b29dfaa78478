//! Prefix maps and CURIE handling

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{LinkMLError, Result};
use crate::types::SchemaDefinition;

/// Key of the namespace used for identifiers that carry no prefix
pub const BASE_PREFIX: &str = "_base";

/// Ordered mapping of prefix names to namespace IRIs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    entries: IndexMap<String, String>,
}

impl PrefixMap {
    /// Empty prefix map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes declared by a schema, in declaration order
    #[must_use]
    pub fn from_schema(schema: &SchemaDefinition) -> Self {
        let mut map = Self::new();
        for (prefix, def) in &schema.prefixes {
            map.entries
                .insert(prefix.clone(), def.reference().to_string());
        }
        map
    }

    /// Insert or replace a prefix
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::Config` if `namespace` is not an absolute IRI.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        let namespace = namespace.into();
        url::Url::parse(&namespace).map_err(|e| {
            LinkMLError::config(format!("prefix '{prefix}' maps to invalid IRI '{namespace}': {e}"))
        })?;
        self.entries.insert(prefix, namespace);
        Ok(())
    }

    /// Overlay `other` on this map; entries in `other` win
    pub fn extend(&mut self, other: &PrefixMap) {
        for (prefix, namespace) in &other.entries {
            self.entries.insert(prefix.clone(), namespace.clone());
        }
    }

    /// Namespace for `prefix`
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Whether the map declares `prefix`
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    /// Number of prefixes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(prefix, namespace)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand a CURIE or pass through an absolute IRI
    ///
    /// Identifiers without a colon resolve against `_base`, then against
    /// `default_prefix` when one is given.
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::UnknownPrefix` when the prefix is undeclared, or
    /// when a bare identifier has no base namespace to resolve against.
    pub fn expand(&self, curie: &str, default_prefix: Option<&str>) -> Result<String> {
        if is_absolute_iri(curie) {
            return Ok(curie.to_string());
        }
        match curie.split_once(':') {
            Some((prefix, local)) => self
                .get(prefix)
                .map(|ns| format!("{ns}{local}"))
                .ok_or_else(|| LinkMLError::UnknownPrefix {
                    prefix: prefix.to_string(),
                    curie: curie.to_string(),
                }),
            None => {
                let base = self
                    .get(BASE_PREFIX)
                    .or_else(|| default_prefix.and_then(|p| self.get(p)));
                base.map(|ns| format!("{ns}{curie}"))
                    .ok_or_else(|| LinkMLError::UnknownPrefix {
                        prefix: default_prefix.unwrap_or(BASE_PREFIX).to_string(),
                        curie: curie.to_string(),
                    })
            }
        }
    }

    /// Contract an IRI to a CURIE using the longest matching namespace
    #[must_use]
    pub fn contract(&self, iri: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|(prefix, ns)| prefix.as_str() != BASE_PREFIX && iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| format!("{prefix}:{}", &iri[ns.len()..]))
    }
}

impl FromIterator<(String, String)> for PrefixMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Whether `value` is an absolute IRI rather than a CURIE
///
/// `http:`, `https:`, `urn:` and anything with `://` count as IRIs.
#[must_use]
pub fn is_absolute_iri(value: &str) -> bool {
    value.contains("://") || value.starts_with("urn:")
}
