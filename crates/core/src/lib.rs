//! Protocols consumed by the navstack router.
//!
//! The router itself never renders anything. It talks to the outside world
//! through the traits in this crate:
//!
//! - [`Renderer`] performs a transition and signals a [`Completion`]
//! - [`KeySerializer`] turns keys into persistable blobs
//! - [`TransitionListener`] observes transitions around the renderer call
//! - [`KeyFilter`] decides which keys are persisted
//!
//! [`SavedStateRegistry`] is the pass-through store for renderer-owned state
//! that travels with the router's saved envelope.

mod completion;
mod context;
mod error;
mod registry;
mod serializer;
mod traits;

pub use completion::{Completion, CompletionSignal};
pub use context::RouterContext;
pub use error::PersistenceError;
pub use registry::{SavedStatePair, SavedStateRegistry};
pub use serializer::{JsonKeySerializer, KeySerializer, StateValue, TaggedBlob};
pub use traits::{KeepAll, KeyFilter, Renderer, TransitionListener};
