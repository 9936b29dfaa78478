//! End-to-end conversion of the CAS JSON-Schema and an MTG taxonomy

use cas_linkml::{
    LinkMLError,
    dumper::{Axiom, ClassExpression, RdfFormat},
    pipeline::{
        convert_cas_schema_to_linkml, decorate_schema, expand_schema, run_data2owl,
        run_rdf_dumper,
    },
};
use cas_linkml_core::settings::{DecorationSettings, ExpansionSettings, OutputSettings};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TARGET_CLASS: &str = "GeneralCellAnnotationOpenStandard";
const AIT: &str = "https://purl.brain-bican.org/ontology/AIT_MTG/";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Import, decorate and expand the fixture schema; returns the final schema path
async fn prepared_schema(dir: &Path) -> Result<PathBuf, anyhow::Error> {
    let imported = dir.join("cas.yaml");
    let decorated = dir.join("cas_decorated.yaml");
    let expanded = dir.join("cas_expanded.yaml");

    convert_cas_schema_to_linkml(
        &fixture("cas_schema.json"),
        "cell-annotation-schema",
        &imported,
    )
    .await?;
    decorate_schema(&imported, &decorated, &DecorationSettings::default(), true).await?;

    let settings = ExpansionSettings {
        ontology_file: Some(fixture("cell_ontology.yaml").display().to_string()),
        value_sets: vec!["Cell_type".to_string()],
        ..ExpansionSettings::default()
    };
    expand_schema(&decorated, &expanded, &settings).await?;
    Ok(expanded)
}

#[tokio::test]
async fn test_import_writes_tree_root() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let out = temp_dir.path().join("cas.yaml");
    let schema = convert_cas_schema_to_linkml(
        &fixture("cas_schema.json"),
        "cell-annotation-schema",
        &out,
    )
    .await?;

    assert!(schema.classes[TARGET_CLASS].tree_root);
    let annotations = &schema.classes[TARGET_CLASS].attributes["annotations"];
    assert_eq!(annotations.range.as_deref(), Some("Annotation"));
    assert_eq!(annotations.inlined_as_list, Some(true));

    let written = std::fs::read_to_string(&out)?;
    assert!(written.contains("name: cell-annotation-schema"));
    assert!(written.contains("GeneralCellAnnotationOpenStandard:"));
    Ok(())
}

#[tokio::test]
async fn test_expansion_with_local_ontology() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let imported = temp_dir.path().join("cas.yaml");
    let decorated = temp_dir.path().join("decorated.yaml");
    let expanded = temp_dir.path().join("expanded.yaml");
    convert_cas_schema_to_linkml(&fixture("cas_schema.json"), "cas", &imported).await?;
    decorate_schema(&imported, &decorated, &DecorationSettings::default(), false).await?;

    let settings = ExpansionSettings {
        ontology_file: Some(fixture("cell_ontology.yaml").display().to_string()),
        value_sets: vec!["Cell_type".to_string()],
        ..ExpansionSettings::default()
    };
    let report = expand_schema(&decorated, &expanded, &settings).await?;
    assert_eq!(report.expanded.get("Cell_type"), Some(&3));

    let written = std::fs::read_to_string(&expanded)?;
    assert!(written.contains("meaning: CL:0000617"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_value_set_fails() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let imported = temp_dir.path().join("cas.yaml");
    convert_cas_schema_to_linkml(&fixture("cas_schema.json"), "cas", &imported).await?;

    let settings = ExpansionSettings {
        ontology_file: Some(fixture("cell_ontology.yaml").display().to_string()),
        value_sets: vec!["Tissue".to_string()],
        ..ExpansionSettings::default()
    };
    let err = expand_schema(&imported, &temp_dir.path().join("out.yaml"), &settings)
        .await
        .unwrap_err();
    assert!(matches!(err, LinkMLError::UnknownValueSet(name) if name == "Tissue"));
    Ok(())
}

#[tokio::test]
async fn test_rdf_dump_round_trips() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let schema = prepared_schema(temp_dir.path()).await?;
    let out = temp_dir.path().join("AIT_MTG_rdf.ttl");

    let triples = run_rdf_dumper(
        &schema,
        &fixture("mtg_taxonomy.json"),
        &out,
        TARGET_CLASS,
        &OutputSettings::default().prefix_map,
        RdfFormat::Turtle,
    )
    .await?
    .expect("taxonomy instantiates");

    let written = std::fs::read_to_string(&out)?;
    let reparsed = oxttl::TurtleParser::new()
        .for_reader(written.as_bytes())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(reparsed.len(), triples);
    assert!(written.contains("RO_0015003") || written.contains("RO:0015003"));
    assert!(written.contains("CS202210140_10"));
    Ok(())
}

#[tokio::test]
async fn test_rdf_dump_of_invalid_data_is_none() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let schema = prepared_schema(temp_dir.path()).await?;
    let out = temp_dir.path().join("AIT_MTG_rdf.owl");
    std::fs::write(&out, "stale")?;

    let written = run_rdf_dumper(
        &schema,
        &fixture("mtg_taxonomy_invalid.json"),
        &out,
        TARGET_CLASS,
        &OutputSettings::default().prefix_map,
        RdfFormat::RdfXml,
    )
    .await?;
    assert_eq!(written, None);
    assert!(!out.exists());
    Ok(())
}

#[tokio::test]
async fn test_data2owl_builds_taxonomy() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let schema = prepared_schema(temp_dir.path()).await?;
    let out = temp_dir.path().join("AIT_MTG.ofn");

    let document = run_data2owl(
        &schema,
        &fixture("mtg_taxonomy.json"),
        &out,
        TARGET_CLASS,
        Some(AIT),
    )
    .await?;

    let subclass = format!("{AIT}CS202210140_10");
    let class = format!("{AIT}CS202210140_1");
    assert!(document.axioms.contains(&Axiom::SubClassOf {
        sub: subclass,
        sup: ClassExpression::Class(class.clone()),
    }));
    assert!(document.axioms.contains(&Axiom::SubClassOf {
        sub: class,
        sup: ClassExpression::ObjectSomeValuesFrom {
            property: "http://purl.obolibrary.org/obo/RO_0002473".to_string(),
            filler: "http://purl.obolibrary.org/obo/CL_0000617".to_string(),
        },
    }));

    let written = std::fs::read_to_string(&out)?;
    assert_eq!(written, document.to_string());
    assert!(written.contains(&format!("Ontology(<{AIT}>")));
    assert_eq!(written.matches("Declaration(Class(").count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_data2owl_propagates_instantiation_errors() -> Result<(), anyhow::Error> {
    let temp_dir = TempDir::new()?;
    let schema = prepared_schema(temp_dir.path()).await?;

    let err = run_data2owl(
        &schema,
        &fixture("mtg_taxonomy_invalid.json"),
        &temp_dir.path().join("out.ofn"),
        TARGET_CLASS,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LinkMLError::Instantiation { .. }));
    assert!(err.to_string().contains("colour"));
    Ok(())
}
