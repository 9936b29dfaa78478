//! Configuration files and prefix maps as the command line tool uses them

use cas_linkml_core::{
    LinkMLError, PrefixMap, SchemaDefinition,
    settings::{CasLinkmlConfig, LogFormat},
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::TempDir;

const WHB_CONFIG: &str = r"
decoration:
  namespace: WHB
  ontology_iri: https://purl.brain-bican.org/ontology/WHB/
  labelsets: [supercluster, cluster, subcluster]
  profile:
    owl_classes: [Annotation]
expansion:
  base_url: http://localhost:8080/api
  timeout: 2m 30s
  value_sets: [Cell_type]
  ontology_file: cl-basic.yaml
output:
  target_class: Taxonomy
  ontology_iri: https://purl.brain-bican.org/ontology/WHB/
  prefix_map:
    WHB: https://purl.brain-bican.org/ontology/WHB/
    _base: https://purl.brain-bican.org/ontology/WHB/
logging:
  level: cas_linkml=debug
  format: json
";

#[test]
fn test_config_file_round_trip() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("cas-linkml.yaml");
    std::fs::write(&path, WHB_CONFIG)?;

    let config = CasLinkmlConfig::from_yaml_file(&path)?;
    assert_eq!(config.decoration.labelsets.len(), 3);
    assert_eq!(config.expansion.timeout, Duration::from_secs(150));
    assert_eq!(config.expansion.ontology_file.as_deref(), Some("cl-basic.yaml"));
    assert_eq!(config.output.target_class, "Taxonomy");
    assert_eq!(config.logging.format, LogFormat::Json);
    // profile fields not named keep their defaults
    assert_eq!(config.decoration.profile.cell_type_enum, "Cell_type");
    assert_eq!(config.decoration.profile.slot_overrides.len(), 7);

    let reloaded = CasLinkmlConfig::from_yaml_str(&serde_yaml::to_string(&config)?)?;
    assert_eq!(reloaded, config);
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let err = CasLinkmlConfig::from_yaml_file("/nonexistent/cas-linkml.yaml").unwrap_err();
    assert!(matches!(err, LinkMLError::IoError(_)));
    assert!(err.to_string().contains("Failed to read config"));
}

#[test]
fn test_bad_prefix_namespace_rejected() {
    let err = CasLinkmlConfig::from_yaml_str("output:\n  prefix_map:\n    X: not a url\n")
        .unwrap_err();
    assert!(matches!(err, LinkMLError::Config(_)));
}

#[test]
fn test_schema_prefixes_expand_identifiers() -> Result<(), anyhow::Error> {
    let schema: SchemaDefinition = serde_yaml::from_str(
        r"
id: https://purl.brain-bican.org/ontology/AIT_MTG/
name: AIT_MTG
default_prefix: MTG
prefixes:
  MTG: https://purl.brain-bican.org/ontology/AIT_MTG/
  CL: http://purl.obolibrary.org/obo/CL_
  Class:
    prefix_prefix: Class
    prefix_reference: https://purl.brain-bican.org/ontology/AIT_MTG/Class#
",
    )?;
    let map = PrefixMap::from_schema(&schema);
    assert_eq!(
        map.expand("CL:0000540", None)?,
        "http://purl.obolibrary.org/obo/CL_0000540"
    );
    assert_eq!(
        map.expand("CS202210140_1", Some("MTG"))?,
        "https://purl.brain-bican.org/ontology/AIT_MTG/CS202210140_1"
    );
    assert_eq!(
        map.expand("Class:Neuronal", None)?,
        "https://purl.brain-bican.org/ontology/AIT_MTG/Class#Neuronal"
    );
    assert_eq!(
        map.contract("https://purl.brain-bican.org/ontology/AIT_MTG/Class#Neuronal")
            .as_deref(),
        Some("Class:Neuronal")
    );
    assert!(matches!(
        map.expand("UBERON:0000955", None),
        Err(LinkMLError::UnknownPrefix { prefix, .. }) if prefix == "UBERON"
    ));
    Ok(())
}
