//! Dumpers rendering instantiated data as RDF or OWL

use cas_linkml_core::error::{LinkMLError, Result};
use std::path::Path;
use std::str::FromStr;

pub mod owl;
pub mod rdf;

pub use owl::{
    AnnotationTarget, Axiom, ClassExpression, EntityKind, OntologyDocument, OwlDumper, OwlLiteral,
};
pub use rdf::RdfDumper;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfFormat {
    /// RDF/XML
    #[default]
    RdfXml,
    /// Turtle
    Turtle,
}

impl RdfFormat {
    /// Format implied by an output file extension
    ///
    /// `.ttl` is Turtle; `.owl`, `.rdf` and `.xml` are RDF/XML.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "owl" | "rdf" | "xml" => Some(Self::RdfXml),
            _ => None,
        }
    }
}

impl FromStr for RdfFormat {
    type Err = LinkMLError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "xml" | "rdfxml" | "rdf/xml" | "rdf-xml" => Ok(Self::RdfXml),
            "ttl" | "turtle" => Ok(Self::Turtle),
            other => Err(LinkMLError::invalid_format(other)),
        }
    }
}

/// Whether `name` is a valid Turtle `PN_PREFIX` and XML namespace prefix
pub(crate) fn is_prefix_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
