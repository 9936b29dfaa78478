//! End-to-end conversions
//!
//! Each function reads its inputs from disk, runs one stage and writes the
//! result, replacing any existing output. These are what the `cas-linkml`
//! subcommands call.

use cas_linkml_core::{
    error::{LinkMLError, Result},
    prefixes::PrefixMap,
    settings::{DecorationSettings, ExpansionSettings},
    types::SchemaDefinition,
};
use std::path::Path;
use std::sync::Arc;

use crate::decorator::{decorate_for_owl, decorate_linkml_schema};
use crate::dumper::{OntologyDocument, OwlDumper, RdfDumper, RdfFormat};
use crate::expansion::{ExpansionReport, LocalOntology, OlsClient, OntologyService, ValueSetExpander};
use crate::file_system_adapter::{FileSystemOperations, TokioFileSystemAdapter};
use crate::instance::{instantiate, load_instance};
use crate::jsonschema::JsonSchemaImporter;
use crate::parser::SchemaLoader;
use crate::schema_view::SchemaView;
use crate::writer::write_schema;

/// Import the CAS JSON-Schema as a LinkML schema and write it as YAML
///
/// # Errors
///
/// Returns an error if the JSON-Schema cannot be read or imported, or the
/// result cannot be written.
pub async fn convert_cas_schema_to_linkml(
    json_path: &Path,
    name: &str,
    out_path: &Path,
) -> Result<SchemaDefinition> {
    let fs = TokioFileSystemAdapter::new();
    let content = fs.read_to_string(json_path).await?;
    let schema = JsonSchemaImporter::new().import_str(&content, name, None)?;
    write_schema(&fs, &schema, out_path).await?;
    Ok(schema)
}

/// Decorate a LinkML schema, optionally with OWL annotations, and write it
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded, lacks a slot or class
/// the decoration profile names, or cannot be written.
pub async fn decorate_schema(
    schema_path: &Path,
    out_path: &Path,
    settings: &DecorationSettings,
    owl: bool,
) -> Result<SchemaDefinition> {
    let schema = load_schema(schema_path).await?;
    let mut decorated = decorate_linkml_schema(
        &schema,
        &settings.namespace,
        &settings.ontology_iri,
        &settings.labelsets,
        &settings.profile,
    )?;
    if owl {
        decorated = decorate_for_owl(&decorated, &settings.profile)?;
    }
    write_schema(&TokioFileSystemAdapter::new(), &decorated, out_path).await?;
    Ok(decorated)
}

/// Expand the dynamic enums of a schema and write the result
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded, names an unknown value
/// set, or the ontology service fails.
pub async fn expand_schema(
    schema_path: &Path,
    out_path: &Path,
    settings: &ExpansionSettings,
) -> Result<ExpansionReport> {
    let mut schema = load_schema(schema_path).await?;
    let service = ontology_service(settings, &PrefixMap::from_schema(&schema)).await?;
    let report = ValueSetExpander::from_settings(service, settings)
        .expand(&mut schema, &settings.value_sets)
        .await?;
    write_schema(&TokioFileSystemAdapter::new(), &schema, out_path).await?;
    tracing::info!(
        value_sets = report.expanded.len(),
        added = report.total_added(),
        skipped = report.skipped.len(),
        "expanded value sets"
    );
    Ok(report)
}

/// The ontology service the settings select: a local term file or OLS
///
/// # Errors
///
/// Returns an error if the term file cannot be read or parsed, or the HTTP
/// client cannot be built.
pub async fn ontology_service(
    settings: &ExpansionSettings,
    prefixes: &PrefixMap,
) -> Result<Arc<dyn OntologyService>> {
    if let Some(path) = &settings.ontology_file {
        let content = TokioFileSystemAdapter::new()
            .read_to_string(Path::new(path))
            .await?;
        let ontology = LocalOntology::from_yaml_str(&content, prefixes)?;
        tracing::info!(path = %path, terms = ontology.len(), "using local ontology");
        return Ok(Arc::new(ontology));
    }
    tracing::info!(base_url = %settings.base_url, "using OLS");
    Ok(Arc::new(OlsClient::from_settings(settings)?))
}

/// Instantiate `data_path` as `target_class` and write it as RDF
///
/// Returns `Ok(None)` when the data does not conform to the schema; the
/// reason is logged and no output is written. Otherwise returns the number
/// of triples written.
///
/// # Errors
///
/// Returns an error for unreadable inputs, unknown prefixes and write
/// failures.
pub async fn run_rdf_dumper(
    schema_path: &Path,
    data_path: &Path,
    out_path: &Path,
    target_class: &str,
    prefix_map: &PrefixMap,
    format: RdfFormat,
) -> Result<Option<usize>> {
    let fs = TokioFileSystemAdapter::new();
    fs.remove_file(out_path).await?;

    let view = SchemaView::new(load_schema(schema_path).await?);
    let data = load_instance(&fs, data_path).await?;
    let instance = match instantiate(&view, target_class, &data) {
        Ok(instance) => instance,
        Err(e @ LinkMLError::Instantiation { .. }) => {
            tracing::error!(
                data = %data_path.display(),
                target_class,
                "Could not instantiate {target_class} from the data: {e}"
            );
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let dumper = RdfDumper::new(&view, prefix_map);
    let graph = dumper.as_rdf_graph(&instance)?;
    let serialized = dumper.serialize(&graph, format)?;
    fs.write(out_path, &serialized).await?;
    tracing::info!(
        path = %out_path.display(),
        triples = graph.len(),
        ?format,
        "wrote RDF"
    );
    Ok(Some(graph.len()))
}

/// Instantiate `data_path` as `target_class` and write it as OWL
/// functional syntax
///
/// The ontology IRI defaults to the schema id.
///
/// # Errors
///
/// Unlike [`run_rdf_dumper`], instantiation errors propagate.
pub async fn run_data2owl(
    schema_path: &Path,
    data_path: &Path,
    out_path: &Path,
    target_class: &str,
    ontology_iri: Option<&str>,
) -> Result<OntologyDocument> {
    let fs = TokioFileSystemAdapter::new();
    let view = SchemaView::new(load_schema(schema_path).await?);
    let data = load_instance(&fs, data_path).await?;
    let instance = instantiate(&view, target_class, &data)?;

    let iri = ontology_iri.unwrap_or(view.schema().id.as_str()).to_string();
    let document = OwlDumper::new(&view).to_ontology_document(&instance, &iri)?;
    fs.write(out_path, &document.to_string()).await?;
    tracing::info!(
        path = %out_path.display(),
        axioms = document.axioms.len(),
        "wrote OWL"
    );
    Ok(document)
}

async fn load_schema(path: &Path) -> Result<SchemaDefinition> {
    SchemaLoader::new().load_file(path).await
}
