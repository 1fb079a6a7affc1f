//! Reducer results and the snapshot handed to renderers.

use crate::{Direction, TransitionId};

/// Result of running a reducer against the committed stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction<K> {
    /// Move to `backstack` in the given direction.
    Transition {
        backstack: Vec<K>,
        direction: Direction,
    },
    /// Discard the request. The renderer is never told about it.
    NoOp,
}

impl<K> Reduction<K> {
    /// Transition to `backstack` in `direction`.
    pub fn to(backstack: Vec<K>, direction: Direction) -> Self {
        Reduction::Transition {
            backstack,
            direction,
        }
    }

    pub fn forward(backstack: Vec<K>) -> Self {
        Self::to(backstack, Direction::Forward)
    }

    pub fn backward(backstack: Vec<K>) -> Self {
        Self::to(backstack, Direction::Backward)
    }

    pub fn replace(backstack: Vec<K>) -> Self {
        Self::to(backstack, Direction::Replace)
    }

    /// Check if this is the no-op result.
    pub fn is_noop(&self) -> bool {
        matches!(self, Reduction::NoOp)
    }
}

/// Immutable description of exactly one transition.
///
/// Built by the router when a queued request is dispatched and passed to the
/// renderer by reference. The router keeps its own copy so that a request in
/// flight can be replayed against a newly attached renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<K> {
    id: TransitionId,
    previous_state: Vec<K>,
    new_state: Vec<K>,
    direction: Direction,
    router_tag: String,
}

impl<K> StateChange<K> {
    pub fn new(
        id: TransitionId,
        previous_state: Vec<K>,
        new_state: Vec<K>,
        direction: Direction,
        router_tag: impl Into<String>,
    ) -> Self {
        Self {
            id,
            previous_state,
            new_state,
            direction,
            router_tag: router_tag.into(),
        }
    }

    /// Id of the dispatch this change belongs to.
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Committed stack before the transition (empty for the attach transition).
    pub fn previous_state(&self) -> &[K] {
        &self.previous_state
    }

    /// Stack that will be committed once the renderer completes.
    pub fn new_state(&self) -> &[K] {
        &self.new_state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Tag of the router that produced this change.
    pub fn router_tag(&self) -> &str {
        &self.router_tag
    }

    /// Destination visible before the transition, if any.
    pub fn top_previous(&self) -> Option<&K> {
        self.previous_state.last()
    }

    /// Destination visible after the transition, if any.
    pub fn top_new(&self) -> Option<&K> {
        self.new_state.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_constructors() {
        assert_eq!(
            Reduction::forward(vec![1, 2]),
            Reduction::Transition {
                backstack: vec![1, 2],
                direction: Direction::Forward
            }
        );
        assert!(Reduction::<u8>::NoOp.is_noop());
        assert!(!Reduction::replace(vec![1]).is_noop());
    }

    #[test]
    fn test_state_change_tops() {
        let change = StateChange::new(
            TransitionId(1),
            vec!["a"],
            vec!["a", "b"],
            Direction::Forward,
            "main",
        );
        assert_eq!(change.top_previous(), Some(&"a"));
        assert_eq!(change.top_new(), Some(&"b"));
        assert_eq!(change.router_tag(), "main");
    }
}
