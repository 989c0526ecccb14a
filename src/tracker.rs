//! Publishes the local window's movement and resizing into the registry.
//!
//! Timer-driven sampling rather than move/resize events: no portable event
//! exists for this signal across the target environments, and the interval
//! is short enough that motion reads as continuous to peers. Each resample
//! also doubles as the self-healing resubmission that repairs lost updates
//! and false evictions.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::geometry::GeometrySource;
use crate::registry::{RegistryStore, WindowId};
use crate::snapshot::LocalSnapshot;

/// Sample the geometry source on `interval`; whenever any of the four
/// fields changed since the last recorded sample, merge the new geometry
/// into this window's entry and publish the result locally. Runs until
/// cancelled.
pub async fn run(
    id: WindowId,
    store: RegistryStore,
    source: Arc<dyn GeometrySource>,
    snapshot: LocalSnapshot,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut last = source.current();

    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let current = source.current();
        if current != last {
            let registry = store.update_entry(&id, current);
            snapshot.publish(registry);
            last = current;
        }
    }
    tracing::debug!(%id, "position tracker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{SharedRect, WindowRect};
    use crate::store::MemoryStore;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_millis(500);

    fn setup() -> (RegistryStore, SharedRect, LocalSnapshot, CancellationToken) {
        let hub = MemoryStore::new();
        let store = RegistryStore::new(Arc::new(hub.handle()));
        let rect = SharedRect::new(WindowRect::new(0, 0, 100, 100));
        (store, rect, LocalSnapshot::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn movement_is_written_through() {
        let (store, rect, snapshot, cancel) = setup();
        let id = WindowId::from("w");
        store.register(&id, rect.current());

        tokio::spawn(run(
            id.clone(),
            store.clone(),
            Arc::new(rect.clone()),
            snapshot.clone(),
            Duration::from_millis(5),
            cancel.clone(),
        ));

        let mut watcher = snapshot.subscribe();
        rect.set(WindowRect::new(50, 60, 100, 100));

        timeout(WAIT, watcher.changed()).await.unwrap().unwrap();
        let entry_rect = store.read_all().get(&id).unwrap().rect();
        assert_eq!(entry_rect, WindowRect::new(50, 60, 100, 100));
        cancel.cancel();
    }

    #[tokio::test]
    async fn unchanged_geometry_writes_nothing() {
        let (store, rect, snapshot, cancel) = setup();
        let id = WindowId::from("w");

        tokio::spawn(run(
            id.clone(),
            store.clone(),
            Arc::new(rect.clone()),
            snapshot.clone(),
            Duration::from_millis(5),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        // The tracker never registered or updated anything.
        assert!(store.read_all().is_empty());
        assert!(snapshot.get().is_empty());
        cancel.cancel();
    }

    #[tokio::test]
    async fn resize_preserves_color() {
        let (store, rect, snapshot, cancel) = setup();
        let id = WindowId::from("w");
        let registered = store.register(&id, rect.current());
        let color = registered.get(&id).unwrap().color.clone();

        tokio::spawn(run(
            id.clone(),
            store.clone(),
            Arc::new(rect.clone()),
            snapshot.clone(),
            Duration::from_millis(5),
            cancel.clone(),
        ));

        let mut watcher = snapshot.subscribe();
        rect.set(WindowRect::new(0, 0, 300, 200));
        timeout(WAIT, watcher.changed()).await.unwrap().unwrap();

        assert_eq!(store.read_all().get(&id).unwrap().color, color);
        cancel.cancel();
    }

    #[tokio::test]
    async fn cancellation_stops_writes() {
        let (store, rect, snapshot, cancel) = setup();
        let id = WindowId::from("w");
        store.register(&id, rect.current());

        let handle = tokio::spawn(run(
            id.clone(),
            store.clone(),
            Arc::new(rect.clone()),
            snapshot.clone(),
            Duration::from_millis(5),
            cancel.clone(),
        ));

        cancel.cancel();
        handle.await.unwrap();

        rect.set(WindowRect::new(77, 77, 77, 77));
        tokio::time::sleep(Duration::from_millis(30)).await;
        let entry_rect = store.read_all().get(&id).unwrap().rect();
        assert_ne!(entry_rect, WindowRect::new(77, 77, 77, 77));
    }
}
