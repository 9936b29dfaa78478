//! Command line behaviour of `cas-linkml`

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cas_linkml() -> Command {
    let mut cmd = Command::cargo_bin("cas-linkml").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Run `import` then `decorate` into `dir`, returning the decorated schema
fn decorated_schema(dir: &Path) -> PathBuf {
    let imported = dir.join("cas.yaml");
    let decorated = dir.join("cas_decorated.yaml");
    cas_linkml()
        .arg("import")
        .arg(fixture("cas_schema.json"))
        .arg("-o")
        .arg(&imported)
        .assert()
        .success();
    cas_linkml()
        .arg("decorate")
        .arg(&imported)
        .arg("-o")
        .arg(&decorated)
        .assert()
        .success();
    decorated
}

#[test]
fn test_help_lists_subcommands() {
    cas_linkml()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("import")
                .and(predicate::str::contains("decorate"))
                .and(predicate::str::contains("expand"))
                .and(predicate::str::contains("rdf"))
                .and(predicate::str::contains("owl")),
        );
}

#[test]
fn test_import_reports_output() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("cas.yaml");
    cas_linkml()
        .arg("import")
        .arg(fixture("cas_schema.json"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("wrote"));
    let written = std::fs::read_to_string(out).unwrap();
    assert!(written.contains("tree_root: true"));
}

#[test]
fn test_decorate_with_labelset_flags() {
    let temp_dir = TempDir::new().unwrap();
    let imported = temp_dir.path().join("cas.yaml");
    let decorated = temp_dir.path().join("whb.yaml");
    cas_linkml()
        .arg("import")
        .arg(fixture("cas_schema.json"))
        .arg("-o")
        .arg(&imported)
        .assert()
        .success();
    cas_linkml()
        .args(["decorate", "--namespace", "WHB"])
        .args(["--ontology-iri", "https://purl.brain-bican.org/ontology/WHB/"])
        .args(["-l", "supercluster", "-l", "cluster"])
        .arg(&imported)
        .arg("-o")
        .arg(&decorated)
        .assert()
        .success();
    let written = std::fs::read_to_string(decorated).unwrap();
    assert!(written.contains("https://purl.brain-bican.org/ontology/WHB/supercluster#"));
    assert!(written.contains("default_prefix: WHB"));
}

#[test]
fn test_owl_writes_functional_syntax() {
    let temp_dir = TempDir::new().unwrap();
    let schema = decorated_schema(temp_dir.path());
    let out = temp_dir.path().join("AIT_MTG.ofn");
    cas_linkml()
        .arg("owl")
        .arg(&schema)
        .arg(fixture("mtg_taxonomy.json"))
        .arg("-o")
        .arg(&out)
        .args(["--ontology-iri", "https://purl.brain-bican.org/ontology/AIT_MTG/"])
        .assert()
        .success()
        .stderr(predicate::str::contains("axioms"));
    let written = std::fs::read_to_string(out).unwrap();
    assert!(written.starts_with("Prefix(owl:=<http://www.w3.org/2002/07/owl#>)"));
    assert!(written.contains("SubClassOf("));
}

#[test]
fn test_rdf_format_from_extension() {
    let temp_dir = TempDir::new().unwrap();
    let schema = decorated_schema(temp_dir.path());
    let out = temp_dir.path().join("AIT_MTG_rdf.owl");
    cas_linkml()
        .arg("rdf")
        .arg(&schema)
        .arg(fixture("mtg_taxonomy.json"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("triples"));
    let written = std::fs::read_to_string(out).unwrap();
    assert!(written.contains("<rdf:RDF"));
}

#[test]
fn test_rdf_of_invalid_data_fails() {
    let temp_dir = TempDir::new().unwrap();
    let schema = decorated_schema(temp_dir.path());
    cas_linkml()
        .arg("rdf")
        .arg(&schema)
        .arg(fixture("mtg_taxonomy_invalid.json"))
        .arg("-o")
        .arg(temp_dir.path().join("out.ttl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not instantiate"));
}

#[test]
fn test_unknown_rdf_format_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let schema = decorated_schema(temp_dir.path());
    cas_linkml()
        .arg("rdf")
        .arg(&schema)
        .arg(fixture("mtg_taxonomy.json"))
        .arg("-o")
        .arg(temp_dir.path().join("out.jsonld"))
        .args(["--format", "json-ld"])
        .assert()
        .failure();
}

#[test]
fn test_bad_config_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("cas-linkml.yaml");
    std::fs::write(&config, "expansion:\n  page_size: 0\n").unwrap();
    cas_linkml()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(fixture("cas_schema.json"))
        .arg("-o")
        .arg(temp_dir.path().join("cas.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}
