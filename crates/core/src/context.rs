//! Read-only view of a router passed to renderer hooks.

use navstack_types::BackstackEntry;

/// Borrowed snapshot of the router state.
///
/// Renderers may read the committed backstack through this view but cannot
/// change it; all mutation goes through queued reducers.
#[derive(Debug, Clone, Copy)]
pub struct RouterContext<'a, K> {
    tag: &'a str,
    backstack: &'a [BackstackEntry<K>],
    paused: bool,
}

impl<'a, K> RouterContext<'a, K> {
    pub fn new(tag: &'a str, backstack: &'a [BackstackEntry<K>], paused: bool) -> Self {
        Self {
            tag,
            backstack,
            paused,
        }
    }

    /// Tag identifying the router.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    /// Committed entries, bottom first.
    pub fn entries(&self) -> &'a [BackstackEntry<K>] {
        self.backstack
    }

    /// Committed keys, bottom first.
    pub fn keys(&self) -> impl Iterator<Item = &'a K> + 'a {
        self.backstack.iter().map(BackstackEntry::key)
    }

    /// Currently visible destination.
    pub fn top(&self) -> Option<&'a K> {
        self.backstack.last().map(BackstackEntry::key)
    }

    pub fn len(&self) -> usize {
        self.backstack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backstack.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
