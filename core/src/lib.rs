//! Core types for converting the Cell Annotation Schema (CAS) into LinkML
//!
//! This crate holds what every stage of the conversion shares: the LinkML
//! schema model, prefix maps, configuration and the error type. The stages
//! themselves live in the `cas-linkml` crate.

#![warn(missing_docs)]

pub mod error;
pub mod prefixes;
pub mod settings;
pub mod types;

pub use error::{LinkMLError, Result};
pub use prefixes::PrefixMap;
pub use types::SchemaDefinition;
