//! Semantic direction of a transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a move between two stack configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// New destination on top of the history (push).
    Forward,
    /// Leaving the current destination (pop).
    Backward,
    /// Swap without history semantics.
    Replace,
}

impl Direction {
    /// Get a human-readable name for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Replace => "replace",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
