//! Error types for reading and converting artifacts.

use thiserror::Error;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A document whose format is known but whose content cannot be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Structured-data syntax error in a JSON document
    #[error("Invalid JSON at line {line}, column {column} (offset {offset}): {message}")]
    InvalidJson {
        message: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    /// Hard error in the YAML subset (an empty key)
    #[error("Malformed YAML at line {line}: {message}")]
    MalformedYaml { message: String, line: usize },

    /// Well-formed data that does not have the shape of an artifact
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),
}

/// Errors that abort a conversion call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Unable to detect input format{}", describe_hint(.hint))]
    UnknownInputFormat { hint: Option<String> },

    #[error("Unknown output format: '{0}' (expected markdown, json or yaml)")]
    UnknownOutputFormat(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn describe_hint(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" for '{}'", hint),
        None => String::new(),
    }
}
