//! Error types for Levelbook.
//!
//! All errors are strongly typed and propagated without panicking.
//! A rulebook error always names the config field that caused it so the
//! caller can keep the previous valid config and report precisely.

/// Levelbook error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum LevelbookError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid rulebook field '{field}': {reason}")]
    Rulebook { field: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LevelbookError {
    /// Construct a rulebook error for a named config field.
    pub fn rulebook(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rulebook {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, LevelbookError>;
