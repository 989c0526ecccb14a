//! In-memory store shared by several handles within one process.
//!
//! Used by tests and by embedders that run several window nodes in a single
//! process. Each handle has a writer identity; write events fan out to every
//! other handle, mirroring how a real shared store only notifies the writers
//! that did not make the change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{StoreBackend, StoreEvent, EVENT_CAPACITY};

/// The shared namespace. Cheap to clone; all clones and handles see the
/// same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    data: RwLock<HashMap<String, Bytes>>,
    handles: RwLock<Vec<HandleSlot>>,
    next_id: AtomicU64,
}

struct HandleSlot {
    id: u64,
    tx: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a handle with its own writer identity.
    pub fn handle(&self) -> MemoryHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        self.inner.handles.write().push(HandleSlot {
            id,
            tx: tx.clone(),
        });
        MemoryHandle {
            shared: Arc::clone(&self.inner),
            id,
            tx,
        }
    }
}

/// One writer's view of a [`MemoryStore`].
pub struct MemoryHandle {
    shared: Arc<Shared>,
    id: u64,
    tx: broadcast::Sender<StoreEvent>,
}

impl StoreBackend for MemoryHandle {
    fn read(&self, key: &str) -> Option<Bytes> {
        self.shared.data.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: Bytes) {
        self.shared
            .data
            .write()
            .insert(key.to_string(), value.clone());

        let event = StoreEvent {
            key: key.to_string(),
            value,
        };
        for slot in self.shared.handles.read().iter() {
            if slot.id != self.id {
                // Send errors mean no subscribers on that handle yet.
                let _ = slot.tx.send(event.clone());
            }
        }
    }

    fn watch_external(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
