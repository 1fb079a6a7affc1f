//! Core value types for navstack.
//!
//! These types are shared by the router, the protocols it consumes and the
//! simulation harness. They carry no behavior beyond equality, ordering and
//! serialization.

mod change;
mod direction;
mod entry;
mod identifiers;

pub use change::{Reduction, StateChange};
pub use direction::Direction;
pub use entry::BackstackEntry;
pub use identifiers::{TransactionIndex, TransitionId};

use std::fmt::Debug;
use std::hash::Hash;

/// Bound for destination keys.
///
/// Keys are opaque to the router: it only compares, hashes, clones and
/// (through a key serializer) persists them.
pub trait Key: Clone + Eq + Hash + Debug + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + Debug + 'static {}
