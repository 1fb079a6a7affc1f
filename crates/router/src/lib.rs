//! Navigation backstack router.
//!
//! This crate provides a synchronous, single-writer coordinator that owns a
//! navigation backstack and serializes changes to it through a FIFO queue of
//! reducers.
//!
//! # Architecture
//!
//! Every request moves through the queue the same way:
//!
//! - `set_backstack(reducer)` → Enqueue; dispatch if idle
//! - Dispatch → Run the reducer against the committed stack; skip no-ops
//! - Renderer → Receives one `StateChange` and a `Completion` token
//! - Completion → Reconcile entries, commit, start the next request
//!
//! The router performs no I/O. Rendering happens in the attached
//! [`Renderer`](navstack_core::Renderer); persistence produces a
//! [`SavedRouterState`] the host stores wherever it likes.

mod builder;
mod config;
mod error;
mod indexer;
mod lifecycle;
pub mod navigation;
mod pending;
mod persistence;
mod reconcile;
mod state;

pub use builder::RouterBuilder;
pub use config::RouterConfig;
pub use error::RouterError;
pub use indexer::TransactionIndexer;
pub use pending::{Reducer, Status};
pub use persistence::{SavedEntry, SavedRouterState};
pub use reconcile::{is_monotonic, reconcile};
pub use state::{ListenerId, Router, RouterState};
