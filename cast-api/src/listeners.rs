//! Registry of listeners keyed by registration id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Handle returned by a registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Thread-safe set of listeners.
///
/// Dispatch works on a [`snapshot`](ListenerSet::snapshot) so callbacks run
/// without the lock held and may register or unregister freely.
pub struct ListenerSet<L: ?Sized> {
    entries: RwLock<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId::next();
        self.entries.write().push((id, listener));
        id
    }

    /// Remove a listener. Returns false if the id was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries.read().iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let set: ListenerSet<dyn Named> = ListenerSet::new();
        let a = set.register(Arc::new(Fixed("a")));
        let b = set.register(Arc::new(Fixed("b")));
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);

        assert!(set.unregister(a));
        assert!(!set.unregister(a));

        let names: Vec<String> = set.snapshot().iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn test_snapshot_is_detached_from_set() {
        let set: ListenerSet<dyn Named> = ListenerSet::new();
        let id = set.register(Arc::new(Fixed("a")));
        let snapshot = set.snapshot();
        set.unregister(id);
        assert!(set.is_empty());
        assert_eq!(snapshot.len(), 1);
    }
}
