//! Error types shared across the pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Shared error taxonomy for the ETL pipeline.
///
/// Stage-specific errors (ledger duplicates, sink load failures) live next
/// to the stage that produces them; this type covers the cross-cutting
/// failures every stage can hit.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl EtlError {
    /// Configuration error with a message, raised before any file is touched.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_message() {
        let err = EtlError::config("BUCKET_NAME not set");
        assert_eq!(err.to_string(), "Configuration error: BUCKET_NAME not set");
    }
}
