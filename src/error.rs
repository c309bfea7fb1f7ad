//! Error types for the triage core.
//!
//! Request input never produces an error here: empty text, empty batches,
//! and sequences with no adjacent pair all have defined fallback outputs.
//! Errors are reserved for startup-time configuration problems and for the
//! injected knowledge store.

/// Top-level error type for the triage core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Knowledge store error: {0}")]
    Store(#[from] StoreError),
}

/// Signal-table validation errors. Fatal at construction time, never
/// triggered by request input.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid signal pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid weight {weight} for {table}: weights must be positive")]
    InvalidWeight { table: String, weight: f64 },
}

/// Knowledge-store errors, surfaced from whatever backend the caller injects.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Append failed: {0}")]
    Append(String),

    #[error("Read failed: {0}")]
    Read(String),
}

/// Result type alias for the triage core.
pub type Result<T> = std::result::Result<T, Error>;
