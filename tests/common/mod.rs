#![allow(dead_code)]

use std::sync::Arc;

use winmesh::bus::{LocalBus, LocalHub};
use winmesh::config::SyncConfig;
use winmesh::geometry::{SharedRect, WindowRect};
use winmesh::lifecycle::WindowNode;
use winmesh::registry::{RegistryStore, WindowId};
use winmesh::store::MemoryStore;

/// Timings tightened so integration tests finish quickly while keeping the
/// same ordering relationships as the defaults (update < debounce < sweep).
pub fn fast_config() -> SyncConfig {
    SyncConfig {
        update_interval_ms: 5,
        debounce_ms: 20,
        sweep_delay_ms: 60,
        store_poll_ms: 10,
    }
}

/// A test window node plus the handles the tests drive it with.
pub struct TestWindow {
    pub id: WindowId,
    pub node: WindowNode,
    pub rect: SharedRect,
    /// The node's own bus endpoint. Closing it without shutting the node
    /// down simulates a crash: the window stops answering pings but its
    /// registry entry stays behind.
    pub bus: Arc<LocalBus>,
}

/// Build a window node on the shared in-memory store and local bus hub.
pub fn window(store: &MemoryStore, hub: &LocalHub, name: &str, rect: WindowRect) -> TestWindow {
    let id = WindowId::from(name);
    let shared_rect = SharedRect::new(rect);
    let bus = Arc::new(hub.endpoint());
    let bus_endpoint: Arc<dyn winmesh::bus::Bus> = bus.clone();
    let node = WindowNode::new(
        id.clone(),
        Arc::new(store.handle()),
        bus_endpoint,
        Arc::new(shared_rect.clone()),
        fast_config(),
    );
    TestWindow {
        id,
        node,
        rect: shared_rect,
        bus,
    }
}

/// An independent registry view for asserting on persisted state.
pub fn inspector(store: &MemoryStore) -> RegistryStore {
    RegistryStore::new(Arc::new(store.handle()))
}
