//! Ping/pong membership sweep.
//!
//! Registry entries outlive the processes that wrote them whenever a window
//! dies without unregistering (crash, forced kill, discarded tab). The
//! sweep asks everyone currently listening to identify themselves, then
//! evicts every entry that did not answer in time. A live-but-slow peer is
//! evicted wrongly; its own tracker re-inserts it on its next movement, so
//! false eviction is transient.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::Bus;
use crate::protocol::SyncMessage;
use crate::registry::{RegistryStore, WindowId};
use crate::snapshot::LocalSnapshot;

/// Run the liveness protocol for one activation.
///
/// Broadcasts one ping, collects pong replies into an alive set seeded with
/// `id`, and after `sweep_delay` prunes the registry to that set, publishing
/// the result locally. The task keeps answering peers' pings for as long as
/// it runs, so later-activating windows can count this one as alive.
/// Cancellation before the deadline suppresses the prune entirely.
pub async fn run(
    id: WindowId,
    bus: Arc<dyn Bus>,
    store: RegistryStore,
    snapshot: LocalSnapshot,
    sweep_delay: Duration,
    cancel: CancellationToken,
) {
    let mut messages = bus.subscribe();
    let mut alive: HashSet<WindowId> = HashSet::new();
    alive.insert(id.clone());

    bus.publish(&SyncMessage::Ping { id: id.clone() });

    let deadline = tokio::time::sleep(sweep_delay);
    tokio::pin!(deadline);
    let mut swept = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = &mut deadline, if !swept => {
                swept = true;
                let registry = store.prune(&alive);
                tracing::debug!(
                    alive = alive.len(),
                    remaining = registry.len(),
                    "liveness sweep complete"
                );
                snapshot.publish(registry);
            }
            msg = messages.recv() => match msg {
                Ok(SyncMessage::Ping { id: from }) => {
                    // Transports do not self-deliver, but a pong to our own
                    // ping would still be wrong if one did.
                    if from != id {
                        bus.publish(&SyncMessage::Pong { id: id.clone() });
                    }
                }
                Ok(SyncMessage::Pong { id: from }) => {
                    alive.insert(from);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "liveness messages lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    tracing::debug!(%id, "liveness task stopped");
}
