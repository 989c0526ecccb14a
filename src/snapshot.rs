//! The local in-memory copy of the registry.
//!
//! Every accepted update replaces the snapshot wholesale; consumers (the
//! rendering layer) watch it and re-derive their scene from whatever is
//! current. The snapshot is the only surface the rendering layer reads.

use std::sync::Arc;

use tokio::sync::watch;

use crate::registry::Registry;

/// Watch-channel-backed snapshot cell. Cheap to clone; all clones publish
/// to and observe the same value.
#[derive(Clone)]
pub struct LocalSnapshot {
    tx: Arc<watch::Sender<Registry>>,
}

impl Default for LocalSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Registry::new());
        Self { tx: Arc::new(tx) }
    }

    /// Replace the snapshot with `registry`, waking all watchers.
    pub fn publish(&self, registry: Registry) {
        self.tx.send_replace(registry);
    }

    /// Current value, cloned out.
    pub fn get(&self) -> Registry {
        self.tx.borrow().clone()
    }

    /// Subscribe to replacements.
    pub fn subscribe(&self) -> watch::Receiver<Registry> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WindowRect;
    use crate::registry::{WindowEntry, WindowId};

    #[test]
    fn starts_empty() {
        let snapshot = LocalSnapshot::new();
        assert!(snapshot.get().is_empty());
    }

    #[tokio::test]
    async fn publish_replaces_wholesale() {
        let snapshot = LocalSnapshot::new();
        let mut rx = snapshot.subscribe();

        let mut first = Registry::new();
        first.insert(
            WindowId::from("a"),
            WindowEntry::new(WindowRect::new(0, 0, 1, 1), "red"),
        );
        snapshot.publish(first);

        let mut second = Registry::new();
        second.insert(
            WindowId::from("b"),
            WindowEntry::new(WindowRect::new(0, 0, 1, 1), "lime"),
        );
        snapshot.publish(second.clone());

        rx.changed().await.unwrap();
        let current = rx.borrow_and_update().clone();
        // The earlier value was replaced, not merged.
        assert_eq!(current, second);
        assert!(!current.contains(&WindowId::from("a")));
    }

    #[test]
    fn clones_share_state() {
        let snapshot = LocalSnapshot::new();
        let other = snapshot.clone();

        let mut registry = Registry::new();
        registry.insert(
            WindowId::from("a"),
            WindowEntry::new(WindowRect::new(0, 0, 1, 1), "red"),
        );
        other.publish(registry);

        assert_eq!(snapshot.get().len(), 1);
    }
}
