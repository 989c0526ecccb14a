//! Best-effort broadcast channel between windows.
//!
//! Carries the ephemeral liveness traffic ([`SyncMessage`]). No delivery,
//! ordering, or persistence guarantee: a window that is not currently
//! listening simply misses the message. An endpoint never receives its own
//! publishes.

mod udp;

pub use udp::{BusError, UdpBus};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::protocol::SyncMessage;

/// Capacity of per-endpoint message channels. Liveness traffic is a handful
/// of messages per activation; slow receivers lag rather than block.
pub(crate) const BUS_CAPACITY: usize = 64;

/// One window's endpoint on the broadcast channel.
pub trait Bus: Send + Sync {
    /// Publish to every other endpoint. Best-effort: no receivers, closed
    /// endpoints, and transport failures are all silent.
    fn publish(&self, msg: &SyncMessage);

    /// Subscribe to messages from other endpoints.
    fn subscribe(&self) -> broadcast::Receiver<SyncMessage>;

    /// Close the endpoint: further publishes are dropped and peers stop
    /// delivering to it.
    fn close(&self);
}

/// In-process hub connecting [`LocalBus`] endpoints.
///
/// Used by tests and by embedders running several window nodes in one
/// process; real cross-process deployments use [`UdpBus`].
#[derive(Clone, Default)]
pub struct LocalHub {
    inner: Arc<HubInner>,
}

#[derive(Default)]
struct HubInner {
    endpoints: RwLock<Vec<EndpointSlot>>,
    next_id: AtomicU64,
}

struct EndpointSlot {
    id: u64,
    tx: broadcast::Sender<SyncMessage>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new endpoint on this hub.
    pub fn endpoint(&self) -> LocalBus {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        self.inner.endpoints.write().push(EndpointSlot {
            id,
            tx: tx.clone(),
        });
        LocalBus {
            hub: Arc::clone(&self.inner),
            id,
            tx,
            closed: AtomicBool::new(false),
        }
    }
}

/// An endpoint on a [`LocalHub`].
pub struct LocalBus {
    hub: Arc<HubInner>,
    id: u64,
    tx: broadcast::Sender<SyncMessage>,
    closed: AtomicBool,
}

impl Bus for LocalBus {
    fn publish(&self, msg: &SyncMessage) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        for slot in self.hub.endpoints.read().iter() {
            if slot.id != self.id {
                let _ = slot.tx.send(msg.clone());
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.tx.subscribe()
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.hub.endpoints.write().retain(|slot| slot.id != self.id);
    }
}
