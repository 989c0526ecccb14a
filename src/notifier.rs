//! Applies registry writes made by other processes to the local snapshot.
//!
//! Notifications are decoded as they arrive, then pass through a trailing
//! debounce: a burst of external writes inside one quiet window collapses
//! to a single snapshot replacement using the latest payload, so a dozen
//! moving peers do not trigger a dozen downstream re-renders.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::registry::{Registry, REGISTRY_KEY};
use crate::snapshot::LocalSnapshot;
use crate::store::StoreEvent;

/// Consume external store events until cancelled. Events for keys other
/// than the registry are ignored. Undecodable payloads are dropped without
/// touching local state; only a successful decode replaces the snapshot.
pub async fn run(
    mut events: broadcast::Receiver<StoreEvent>,
    snapshot: LocalSnapshot,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut pending: Option<Registry> = None;

    // The timer only participates in the select while a payload is pending;
    // its initial duration is never observed.
    let timer = tokio::time::sleep(Duration::from_secs(3600));
    tokio::pin!(timer);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = &mut timer, if pending.is_some() => {
                if let Some(registry) = pending.take() {
                    snapshot.publish(registry);
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if event.key != REGISTRY_KEY {
                        continue;
                    }
                    match serde_json::from_slice::<Registry>(&event.value) {
                        Ok(registry) => {
                            pending = Some(registry);
                            timer.as_mut().reset(tokio::time::Instant::now() + debounce);
                        }
                        Err(err) => {
                            tracing::debug!(%err, "ignoring undecodable registry notification");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change notifications lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    tracing::debug!("change notifier stopped");
}
