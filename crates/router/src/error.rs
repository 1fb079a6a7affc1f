//! Error types for the router.

use navstack_core::PersistenceError;
use thiserror::Error;

/// Errors surfaced by router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Dispatch was requested while no renderer is attached.
    ///
    /// This is a configuration error; the request is not retried.
    #[error("state changer is null")]
    NoRenderer,

    /// The saved envelope belongs to a different router.
    #[error("Saved state belongs to router {found:?}, expected {expected:?}")]
    TagMismatch { expected: String, found: String },

    /// Saving or restoring serialized state failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Persistence(PersistenceError::Malformed(err))
    }
}
