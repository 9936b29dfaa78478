//! Cell Annotation Schema to LinkML, OWL and RDF
//!
//! The stages of the conversion, each usable on its own:
//!
//! - [`jsonschema`]: import the CAS JSON-Schema as a LinkML schema
//! - [`decorator`]: add ontology mappings, prefixes and dynamic enums
//! - [`expansion`]: expand dynamic enums against an ontology service
//! - [`instance`]: instantiate annotation data against the schema
//! - [`dumper`]: render instances as RDF or OWL functional syntax
//!
//! [`pipeline`] strings them together the way the command line tool does.

#![warn(missing_docs)]

pub mod decorator;
pub mod dumper;
pub mod expansion;
pub mod file_system_adapter;
pub mod instance;
pub mod jsonschema;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod schema_view;
pub mod writer;

pub use cas_linkml_core::{LinkMLError, PrefixMap, Result, SchemaDefinition};
pub use decorator::{decorate_for_owl, decorate_linkml_schema};
pub use dumper::{OwlDumper, RdfDumper, RdfFormat};
pub use expansion::{ExpansionReport, LocalOntology, OlsClient, OntologyService, ValueSetExpander};
pub use instance::{InstanceObject, InstanceValue, instantiate};
pub use jsonschema::JsonSchemaImporter;
pub use schema_view::SchemaView;
