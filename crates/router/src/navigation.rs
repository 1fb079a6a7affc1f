//! Common navigation reducers.
//!
//! Each function returns a reducer for [`Router::set_backstack`]. Reducers
//! run against the stack committed when the request reaches the head of the
//! queue, not the stack at the time of the call.

use crate::Router;
use navstack_core::StateValue;
use navstack_types::{Direction, Key, Reduction};

/// Append `key`. Duplicates are allowed.
pub fn push<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |mut stack| {
        stack.push(key);
        Reduction::forward(stack)
    }
}

/// Remove every entry equal to `key`. No-op if it is absent.
pub fn pop<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |mut stack| {
        let before = stack.len();
        stack.retain(|k| k != &key);
        if stack.len() == before {
            Reduction::NoOp
        } else {
            Reduction::backward(stack)
        }
    }
}

/// Remove the top entry. No-op on an empty stack.
pub fn pop_top<K: Key>() -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    |mut stack| match stack.pop() {
        Some(_) => Reduction::backward(stack),
        None => Reduction::NoOp,
    }
}

/// Drop everything above the last occurrence of `key`.
///
/// No-op if `key` is absent or already on top.
pub fn pop_to<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |mut stack| match stack.iter().rposition(|k| k == &key) {
        Some(pos) if pos + 1 < stack.len() => {
            stack.truncate(pos + 1);
            Reduction::backward(stack)
        }
        _ => Reduction::NoOp,
    }
}

/// Keep only the bottom entry. No-op when at most one entry is present.
pub fn pop_to_root<K: Key>() -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    |mut stack| {
        if stack.len() <= 1 {
            return Reduction::NoOp;
        }
        stack.truncate(1);
        Reduction::backward(stack)
    }
}

/// Swap the top entry for `key`. On an empty stack `key` becomes the root.
pub fn replace_top<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |mut stack| {
        stack.pop();
        stack.push(key);
        Reduction::replace(stack)
    }
}

/// Make `key` the only entry.
pub fn set_root<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |_| Reduction::forward(vec![key])
}

/// Navigate to `key`, reusing an existing entry where possible.
///
/// Already on top: replace with the same stack. Present lower down: truncate
/// back to it. Absent: push it.
pub fn go_to<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |stack| go_to_in(stack, key)
}

/// Navigate "up" to a parent destination.
///
/// With at most one entry the top is replaced (backward). Otherwise behaves
/// like [`go_to`] if `key` is present, else replaces the top (forward).
pub fn go_up<K: Key>(key: K) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |mut stack| {
        if stack.len() <= 1 {
            stack.pop();
            stack.push(key);
            return Reduction::backward(stack);
        }
        if stack.contains(&key) {
            return go_to_in(stack, key);
        }
        stack.pop();
        stack.push(key);
        Reduction::forward(stack)
    }
}

/// Set an explicit stack.
pub fn set<K: Key>(
    keys: Vec<K>,
    direction: Direction,
) -> impl FnOnce(Vec<K>) -> Reduction<K> + 'static {
    move |_| Reduction::to(keys, direction)
}

fn go_to_in<K: Key>(mut stack: Vec<K>, key: K) -> Reduction<K> {
    if stack.last() == Some(&key) {
        return Reduction::replace(stack);
    }
    match stack.iter().position(|k| k == &key) {
        Some(pos) => {
            stack.truncate(pos + 1);
            Reduction::backward(stack)
        }
        None => {
            stack.push(key);
            Reduction::forward(stack)
        }
    }
}

impl<K: Key, V: StateValue> Router<K, V> {
    pub fn push(&mut self, key: K) {
        self.set_backstack(push(key));
    }

    pub fn pop(&mut self, key: K) {
        self.set_backstack(pop(key));
    }

    pub fn pop_top(&mut self) {
        self.set_backstack(pop_top());
    }

    pub fn pop_to(&mut self, key: K) {
        self.set_backstack(pop_to(key));
    }

    pub fn pop_to_root(&mut self) {
        self.set_backstack(pop_to_root());
    }

    pub fn replace_top(&mut self, key: K) {
        self.set_backstack(replace_top(key));
    }

    pub fn set_root(&mut self, key: K) {
        self.set_backstack(set_root(key));
    }

    pub fn go_to(&mut self, key: K) {
        self.set_backstack(go_to(key));
    }

    pub fn go_up(&mut self, key: K) {
        self.set_backstack(go_up(key));
    }

    /// Enqueue an explicit stack.
    pub fn set(&mut self, keys: Vec<K>, direction: Direction) {
        self.set_backstack(set(keys, direction));
    }

    /// Replace the stack with its root entry.
    ///
    /// Unlike [`pop_to_root`] this is a replace transition. Returns false
    /// without enqueueing anything when the committed stack has at most one
    /// entry.
    pub fn jump_to_root(&mut self) -> bool {
        if self.backstack.len() <= 1 {
            return false;
        }
        self.set_backstack(|mut stack: Vec<K>| {
            if stack.len() <= 1 {
                return Reduction::NoOp;
            }
            stack.truncate(1);
            Reduction::replace(stack)
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouterConfig;
    use navstack_core::JsonKeySerializer;
    use navstack_test_helpers::{keys, RecordingRenderer};
    use tracing_test::traced_test;

    fn run<F>(reducer: F, stack: &[&'static str]) -> Reduction<&'static str>
    where
        F: FnOnce(Vec<&'static str>) -> Reduction<&'static str>,
    {
        reducer(stack.to_vec())
    }

    #[test]
    fn test_push_allows_duplicates() {
        assert_eq!(
            run(push("a"), &["a", "b"]),
            Reduction::forward(vec!["a", "b", "a"])
        );
    }

    #[test]
    fn test_pop_removes_every_occurrence() {
        assert_eq!(
            run(pop("a"), &["a", "b", "a"]),
            Reduction::backward(vec!["b"])
        );
        assert_eq!(run(pop("z"), &["a"]), Reduction::NoOp);
    }

    #[test]
    fn test_pop_top() {
        assert_eq!(run(pop_top(), &["a", "b"]), Reduction::backward(vec!["a"]));
        assert_eq!(run(pop_top(), &["a"]), Reduction::backward(vec![]));
        assert_eq!(run(pop_top(), &[]), Reduction::NoOp);
    }

    #[test]
    fn test_pop_to_uses_last_occurrence() {
        assert_eq!(
            run(pop_to("a"), &["a", "b", "a", "c"]),
            Reduction::backward(vec!["a", "b", "a"])
        );
        assert_eq!(run(pop_to("c"), &["a", "c"]), Reduction::NoOp);
        assert_eq!(run(pop_to("z"), &["a", "c"]), Reduction::NoOp);
    }

    #[test]
    fn test_pop_to_root() {
        assert_eq!(
            run(pop_to_root(), &["a", "b", "c"]),
            Reduction::backward(vec!["a"])
        );
        assert_eq!(run(pop_to_root(), &["a"]), Reduction::NoOp);
    }

    #[test]
    fn test_replace_top_and_set_root() {
        assert_eq!(
            run(replace_top("c"), &["a", "b"]),
            Reduction::replace(vec!["a", "c"])
        );
        assert_eq!(run(replace_top("c"), &[]), Reduction::replace(vec!["c"]));
        assert_eq!(
            run(set_root("r"), &["a", "b"]),
            Reduction::forward(vec!["r"])
        );
    }

    #[test]
    fn test_go_to() {
        assert_eq!(
            run(go_to("b"), &["a", "b"]),
            Reduction::replace(vec!["a", "b"])
        );
        assert_eq!(
            run(go_to("a"), &["a", "b", "c"]),
            Reduction::backward(vec!["a"])
        );
        assert_eq!(
            run(go_to("d"), &["a", "b"]),
            Reduction::forward(vec!["a", "b", "d"])
        );
    }

    #[test]
    fn test_go_up() {
        assert_eq!(run(go_up("p"), &["a"]), Reduction::backward(vec!["p"]));
        assert_eq!(
            run(go_up("a"), &["a", "b", "c"]),
            Reduction::backward(vec!["a"])
        );
        assert_eq!(
            run(go_up("p"), &["a", "b"]),
            Reduction::forward(vec!["a", "p"])
        );
    }

    #[test]
    fn test_set_uses_given_direction() {
        assert_eq!(
            run(set(vec!["x", "y"], Direction::Replace), &["a"]),
            Reduction::replace(vec!["x", "y"])
        );
    }

    #[traced_test]
    #[test]
    fn test_router_convenience_methods() {
        let mut router: Router<String> = Router::new(
            RouterConfig::new(keys(&["home"])),
            Box::new(JsonKeySerializer::new()),
        );
        router.set_renderer(RecordingRenderer::new());

        router.push("list".to_string());
        router.push("detail".to_string());
        router.go_to("list".to_string());
        assert_eq!(router.backstack(), keys(&["home", "list"]));

        router.replace_top("search".to_string());
        router.go_up("home".to_string());
        assert_eq!(router.backstack(), keys(&["home"]));

        assert!(!router.jump_to_root());
        router.set(keys(&["home", "a", "b"]), Direction::Forward);
        assert!(router.jump_to_root());
        assert_eq!(router.backstack(), keys(&["home"]));

        router.set_root("login".to_string());
        router.pop("login".to_string());
        assert!(router.is_empty());
    }

    #[traced_test]
    #[test]
    fn test_jump_to_root_replaces() {
        let mut router: Router<String> = Router::new(
            RouterConfig::new(keys(&["home", "a", "b"])),
            Box::new(JsonKeySerializer::new()),
        );
        let renderer = RecordingRenderer::new();
        let log = renderer.log();
        router.set_renderer(renderer);

        assert!(router.jump_to_root());
        let last = log.changes().pop().unwrap();
        assert_eq!(last.previous_state(), keys(&["home", "a", "b"]).as_slice());
        assert_eq!(last.new_state(), keys(&["home"]).as_slice());
        assert_eq!(last.direction(), Direction::Replace);
        assert_eq!(log.overlapping(), 0);
    }
}
