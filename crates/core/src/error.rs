//! Error types for persistence.

use thiserror::Error;

/// Errors while saving or restoring serialized state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The blob could not be parsed.
    #[error("Malformed saved state: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required section is absent from the blob.
    #[error("Missing saved state field: {0}")]
    MissingField(String),

    /// A key was saved with a type hint this serializer does not handle.
    #[error("Unknown key type: expected {expected}, found {found}")]
    UnknownType { expected: String, found: String },

    /// A value decoded to a type whose tag differs from the stored one.
    #[error("Saved value type mismatch: stored {stored}, decoded {decoded}")]
    TypeMismatch { stored: String, decoded: String },

    /// A saved entry carries a negative transaction index.
    #[error("Invalid saved transaction index: {0}")]
    InvalidIndex(i64),

    /// The key serializer rejected a key.
    #[error("Key serialization failed: {0}")]
    Key(String),
}
