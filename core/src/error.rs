//! Error types for CAS to LinkML conversion
//!
//! Every fallible operation in the workspace returns [`Result`], whose error
//! side is [`LinkMLError`]. Constructor helpers keep call sites short.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, LinkMLError>;

/// Errors raised while loading, transforming or dumping schemas and data
#[derive(Debug, Error)]
pub enum LinkMLError {
    /// Document could not be parsed
    #[error("Parse error: {message}{}", location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default())]
    ParseError {
        /// What went wrong
        message: String,
        /// Where it went wrong, when known
        location: Option<String>,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Schema is structurally invalid for the requested operation
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// A class, slot or enum the operation depends on is absent
    #[error("Missing {kind} '{name}'")]
    MissingElement {
        /// Element kind ("class", "slot", "enum")
        kind: &'static str,
        /// Element name
        name: String,
    },

    /// A value set named by the caller is not an enum of the schema
    #[error("Unknown value set '{0}'")]
    UnknownValueSet(String),

    /// A CURIE uses a prefix that no prefix map declares
    #[error("Unknown prefix '{prefix}' in '{curie}'")]
    UnknownPrefix {
        /// The undeclared prefix
        prefix: String,
        /// The CURIE being expanded
        curie: String,
    },

    /// Instance data does not conform to the target class
    #[error("Could not instantiate {class}: {message}")]
    Instantiation {
        /// Target class
        class: String,
        /// Reason, including the offending path
        message: String,
    },

    /// Failure talking to an external service
    #[error("Service error: {0}")]
    Service(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Import resolution failed
    #[error("Import error for '{import}': {message}")]
    Import {
        /// Import being resolved
        import: String,
        /// Reason
        message: String,
    },

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LinkMLError {
    /// Parse error without location
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }

    /// Parse error with a location description
    pub fn parse_at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// I/O error from a plain message
    pub fn io(message: impl Into<String>) -> Self {
        Self::IoError(std::io::Error::other(message.into()))
    }

    /// Schema validation error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation(message.into())
    }

    /// Missing class
    pub fn missing_class(name: impl Into<String>) -> Self {
        Self::MissingElement {
            kind: "class",
            name: name.into(),
        }
    }

    /// Missing slot
    pub fn missing_slot(name: impl Into<String>) -> Self {
        Self::MissingElement {
            kind: "slot",
            name: name.into(),
        }
    }

    /// Missing enum
    pub fn missing_enum(name: impl Into<String>) -> Self {
        Self::MissingElement {
            kind: "enum",
            name: name.into(),
        }
    }

    /// Instantiation failure for `class`
    pub fn instantiation(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            class: class.into(),
            message: message.into(),
        }
    }

    /// External service failure
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Import resolution error
    pub fn import(import: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Import {
            import: import.into(),
            message: message.into(),
        }
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Unsupported input or output format
    pub fn invalid_format(format: impl AsRef<str>) -> Self {
        Self::parse(format!("Unsupported format: {}", format.as_ref()))
    }
}

impl From<serde_yaml::Error> for LinkMLError {
    fn from(e: serde_yaml::Error) -> Self {
        match e.location() {
            Some(l) => Self::parse_at(
                format!("YAML error: {e}"),
                format!("line {}, column {}", l.line(), l.column()),
            ),
            None => Self::parse(format!("YAML error: {e}")),
        }
    }
}

impl From<serde_json::Error> for LinkMLError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse_at(
            format!("JSON error: {e}"),
            format!("line {}, column {}", e.line(), e.column()),
        )
    }
}
