use thiserror::Error;

use crate::schema::ValidationIssues;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("validation failed: {0}")]
    Validation(ValidationIssues),
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Faults the submission pipeline does not handle itself.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("contact store failure: {0:#}")]
    Store(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("config does not match schema: {}", .0.join(", "))]
    Schema(Vec<String>),
}
