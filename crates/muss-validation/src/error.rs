// Error types for schema registries

use thiserror::Error;

/// Errors raised while loading or compiling a schema registry.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field rule whose pattern does not compile
    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// A field rule that names more than one scope
    #[error("Invalid rule for field '{field}': {message}")]
    InvalidRule { field: String, message: String },

    #[error("Invalid token budget for mode '{mode}': min {min} exceeds max {max}")]
    InvalidBudget { mode: String, min: usize, max: usize },
}

/// Result type for registry loading
pub type SchemaResult<T> = Result<T, SchemaError>;
