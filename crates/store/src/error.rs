//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from the log store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database-level failure
    #[error("database error: {0}")]
    Database(#[from] turso::Error),

    /// JSON (de)serialization of a side-payload column failed
    #[error("payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    /// A user-supplied field name is not in the schema whitelist
    #[error("unknown field '{0}'")]
    Field(String),

    /// The requested aggregation target is not numeric
    #[error("field '{0}' is not numeric")]
    NotNumeric(String),

    /// No row with the requested id
    #[error("log {0} not found")]
    NotFound(i64),
}
