//! Configuration for a router.

/// Configuration for a [`Router`](crate::Router).
#[derive(Debug, Clone)]
pub struct RouterConfig<K> {
    /// Identifies the router in state changes and in its saved envelope.
    ///
    /// Several routers persisted into one document must use distinct tags.
    pub tag: String,

    /// Whether back navigation may remove the last remaining key.
    ///
    /// When disabled, the bottom key is never popped by `handle_back` and the
    /// stack stays non-empty once the first transition has committed.
    pub pops_last_key: bool,

    /// Keys committed by the attach transition when the stack is empty.
    pub initial_keys: Vec<K>,
}

impl<K> Default for RouterConfig<K> {
    fn default() -> Self {
        Self {
            tag: String::new(),
            pops_last_key: false,
            initial_keys: Vec::new(),
        }
    }
}

impl<K> RouterConfig<K> {
    /// Create a config with the given initial keys.
    pub fn new(initial_keys: Vec<K>) -> Self {
        Self {
            initial_keys,
            ..Default::default()
        }
    }

    /// Set the router tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Allow back navigation to empty the stack.
    pub fn with_pops_last_key(mut self, pops_last_key: bool) -> Self {
        self.pops_last_key = pops_last_key;
        self
    }

    /// Set the initial keys.
    pub fn with_initial_keys(mut self, initial_keys: Vec<K>) -> Self {
        self.initial_keys = initial_keys;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = RouterConfig::new(vec!["home"])
            .with_tag("main")
            .with_pops_last_key(true);
        assert_eq!(config.tag, "main");
        assert!(config.pops_last_key);
        assert_eq!(config.initial_keys, vec!["home"]);

        let config: RouterConfig<&str> = RouterConfig::default();
        assert!(!config.pops_last_key);
        assert!(config.initial_keys.is_empty());
    }
}
