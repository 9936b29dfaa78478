//! Configuration for the conversion pipeline
//!
//! All sections have working defaults that reproduce the conversion of the
//! CAS schema and the AIT MTG taxonomy. A YAML file may override any of them:
//!
//! ```yaml
//! decoration:
//!   namespace: MTG
//!   ontology_iri: https://purl.brain-bican.org/ontology/AIT_MTG/
//!   labelsets: [CrossArea_cluster, CrossArea_subclass, Class]
//! expansion:
//!   base_url: https://www.ebi.ac.uk/ols4/api
//!   timeout: 30s
//! output:
//!   target_class: GeneralCellAnnotationOpenStandard
//! logging:
//!   level: info
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{LinkMLError, Result};
use crate::prefixes::PrefixMap;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasLinkmlConfig {
    /// Schema decoration parameters
    pub decoration: DecorationSettings,
    /// Value-set expansion parameters
    pub expansion: ExpansionSettings,
    /// Dumper parameters
    pub output: OutputSettings,
    /// Logging parameters
    pub logging: LoggingSettings,
}

impl CasLinkmlConfig {
    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed YAML and a config error when the
    /// result fails [`CasLinkmlConfig::validate`].
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`CasLinkmlConfig::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LinkMLError::io(format!("Failed to read config {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::from_yaml_str(&content)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.decoration.namespace.trim().is_empty() {
            return Err(LinkMLError::config("decoration.namespace must not be empty"));
        }
        url::Url::parse(&self.decoration.ontology_iri).map_err(|e| {
            LinkMLError::config(format!(
                "decoration.ontology_iri '{}' is not an IRI: {e}",
                self.decoration.ontology_iri
            ))
        })?;
        url::Url::parse(&self.expansion.base_url).map_err(|e| {
            LinkMLError::config(format!(
                "expansion.base_url '{}' is not a URL: {e}",
                self.expansion.base_url
            ))
        })?;
        if self.expansion.page_size == 0 {
            return Err(LinkMLError::config("expansion.page_size must be positive"));
        }
        if self.output.target_class.trim().is_empty() {
            return Err(LinkMLError::config("output.target_class must not be empty"));
        }
        for (prefix, namespace) in self.output.prefix_map.iter() {
            url::Url::parse(namespace).map_err(|e| {
                LinkMLError::config(format!("output.prefix_map.{prefix} is not an IRI: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Parameters of the schema decoration step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationSettings {
    /// Short namespace of the generated ontology
    pub namespace: String,
    /// IRI of the generated ontology
    pub ontology_iri: String,
    /// Label-set names that become enums and prefixes
    pub labelsets: Vec<String>,
    /// What decoration adds beyond the three parameters above
    pub profile: DecorationProfile,
}

impl Default for DecorationSettings {
    fn default() -> Self {
        Self {
            namespace: "MTG".to_string(),
            ontology_iri: "https://purl.brain-bican.org/ontology/AIT_MTG/".to_string(),
            labelsets: vec![
                "CrossArea_cluster".to_string(),
                "CrossArea_subclass".to_string(),
                "Class".to_string(),
            ],
            profile: DecorationProfile::default(),
        }
    }
}

/// Fixed decoration content: prefixes, enums and slot overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationProfile {
    /// Prefixes always added to the schema
    pub base_prefixes: IndexMap<String, String>,
    /// Name of the enum holding cell types
    pub cell_type_enum: String,
    /// Ontology the cell-type enum is drawn from
    pub cell_type_ontology: String,
    /// Root term of the cell-type enum
    pub cell_type_root: String,
    /// Per-slot overrides, keyed by slot name
    pub slot_overrides: IndexMap<String, SlotOverride>,
    /// Classes that become OWL classes in the OWL rendering
    pub owl_classes: Vec<String>,
    /// Slot name to OWL axiom template
    pub owl_slots: IndexMap<String, String>,
}

impl Default for DecorationProfile {
    fn default() -> Self {
        let base_prefixes = [
            ("linkml", "https://w3id.org/linkml/"),
            ("CAS", "https://purl.brain-bican.org/ontology/CAS/"),
            ("CL", "http://purl.obolibrary.org/obo/CL_"),
            ("PCL", "http://purl.obolibrary.org/obo/PCL_"),
            ("RO", "http://purl.obolibrary.org/obo/RO_"),
            ("obo", "http://purl.obolibrary.org/obo/"),
            ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
            ("skos", "http://www.w3.org/2004/02/skos/core#"),
            ("oboInOwl", "http://www.geneontology.org/formats/oboInOwl#"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let slot_overrides = [
            (
                "cell_set_accession",
                SlotOverride {
                    identifier: Some(true),
                    ..SlotOverride::default()
                },
            ),
            (
                "parent_cell_set_accession",
                SlotOverride {
                    slot_uri: Some("RO:0015003".to_string()),
                    range: Some("Annotation".to_string()),
                    ..SlotOverride::default()
                },
            ),
            (
                "cell_ontology_term_id",
                SlotOverride {
                    slot_uri: Some("RO:0002473".to_string()),
                    range: Some("Cell_type".to_string()),
                    ..SlotOverride::default()
                },
            ),
            (
                "cell_label",
                SlotOverride {
                    slot_uri: Some("rdfs:label".to_string()),
                    ..SlotOverride::default()
                },
            ),
            (
                "labelset",
                SlotOverride {
                    slot_uri: Some("CAS:has_labelset".to_string()),
                    range: Some("Labelset".to_string()),
                    ..SlotOverride::default()
                },
            ),
            (
                "synonyms",
                SlotOverride {
                    slot_uri: Some("oboInOwl:hasExactSynonym".to_string()),
                    ..SlotOverride::default()
                },
            ),
            (
                "name",
                SlotOverride {
                    identifier: Some(true),
                    class: Some("Labelset".to_string()),
                    ..SlotOverride::default()
                },
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let owl_slots = [
            ("cell_label", "AnnotationAssertion"),
            ("synonyms", "AnnotationAssertion"),
            ("rationale", "AnnotationAssertion"),
            ("parent_cell_set_accession", "SubClassOf"),
            ("cell_ontology_term_id", "SubClassOf, ObjectSomeValuesFrom"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_prefixes,
            cell_type_enum: "Cell_type".to_string(),
            cell_type_ontology: "obo:cl".to_string(),
            cell_type_root: "CL:0000000".to_string(),
            slot_overrides,
            owl_classes: vec!["Annotation".to_string()],
            owl_slots,
        }
    }
}

/// Overrides applied to one slot during decoration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotOverride {
    /// New slot URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_uri: Option<String>,
    /// New range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// New identifier flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<bool>,
    /// Class whose attribute to change; all owners when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// Parameters of value-set expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionSettings {
    /// Base URL of the OLS REST API
    pub base_url: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Page size for paginated term listings
    pub page_size: usize,
    /// Use term labels as permissible value text
    pub labels_as_text: bool,
    /// Enums to expand; every dynamic enum when empty
    pub value_sets: Vec<String>,
    /// Local term file used instead of OLS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_file: Option<String>,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebi.ac.uk/ols4/api".to_string(),
            timeout: Duration::from_secs(30),
            page_size: 500,
            labels_as_text: true,
            value_sets: Vec::new(),
            ontology_file: None,
        }
    }
}

/// Parameters of the RDF and OWL dumpers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Class the instance document is instantiated as
    pub target_class: String,
    /// Prefixes declared in RDF output and used to mint IRIs
    pub prefix_map: PrefixMap,
    /// Ontology IRI for OWL output; the schema id when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_iri: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        let ait = "https://purl.brain-bican.org/ontology/AIT_MTG/";
        let cas = "https://purl.brain-bican.org/ontology/CAS/";
        let prefix_map = [
            ("CAS", cas.to_string()),
            ("General_Cell_Annotation_Open_Standard", cas.to_string()),
            ("_base", ait.to_string()),
            ("MTG", ait.to_string()),
            ("CrossArea_cluster", format!("{ait}CrossArea_cluster#")),
            ("CrossArea_subclass", format!("{ait}CrossArea_subclass#")),
            ("Class", format!("{ait}Class#")),
            ("CL", "http://purl.obolibrary.org/obo/CL_".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            target_class: "GeneralCellAnnotationOpenStandard".to_string(),
            prefix_map,
            ontology_iri: None,
        }
    }
}

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Line format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_validate() {
        CasLinkmlConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CasLinkmlConfig::from_yaml_str(
            r"
decoration:
  namespace: WHB
  ontology_iri: https://purl.brain-bican.org/ontology/WHB/
  labelsets: [supercluster, cluster]
expansion:
  timeout: 5s
",
        )
        .unwrap();
        assert_eq!(config.decoration.namespace, "WHB");
        assert_eq!(config.decoration.labelsets, vec!["supercluster", "cluster"]);
        assert_eq!(config.expansion.timeout, Duration::from_secs(5));
        assert_eq!(config.expansion.page_size, 500);
        assert_eq!(config.decoration.profile.cell_type_root, "CL:0000000");
        assert_eq!(
            config.output.target_class,
            "GeneralCellAnnotationOpenStandard"
        );
    }

    #[test]
    fn test_invalid_ontology_iri_rejected() {
        let err = CasLinkmlConfig::from_yaml_str(
            r"
decoration:
  ontology_iri: not-an-iri
",
        )
        .unwrap_err();
        assert!(matches!(err, LinkMLError::Config(_)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = CasLinkmlConfig::from_yaml_str("expansion:\n  page_size: 0\n").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_default_prefix_map_matches_taxonomy() {
        let output = OutputSettings::default();
        assert_eq!(
            output.prefix_map.get("CrossArea_cluster"),
            Some("https://purl.brain-bican.org/ontology/AIT_MTG/CrossArea_cluster#")
        );
        assert_eq!(output.prefix_map.len(), 8);
    }
}
