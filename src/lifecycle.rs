//! Per-process orchestration: registration, background activities, teardown.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bus::Bus;
use crate::config::SyncConfig;
use crate::geometry::GeometrySource;
use crate::registry::{RegistryStore, WindowId};
use crate::snapshot::LocalSnapshot;
use crate::store::StoreBackend;
use crate::{liveness, notifier, tracker};

/// Lifecycle of one window node. An explicit state rather than a hidden
/// initialization flag, so re-activation is an observable transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Starting,
    Running,
    Stopped,
}

/// One process's handle on the shared registry.
///
/// Owns the store handle, bus endpoint, geometry source, and the local
/// snapshot, and runs the three background activities between `activate()`
/// and `shutdown()`.
pub struct WindowNode {
    id: WindowId,
    backend: Arc<dyn StoreBackend>,
    store: RegistryStore,
    bus: Arc<dyn Bus>,
    geometry: Arc<dyn GeometrySource>,
    snapshot: LocalSnapshot,
    config: SyncConfig,
    state: Mutex<LifecycleState>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl WindowNode {
    pub fn new(
        id: WindowId,
        backend: Arc<dyn StoreBackend>,
        bus: Arc<dyn Bus>,
        geometry: Arc<dyn GeometrySource>,
        config: SyncConfig,
    ) -> Self {
        let store = RegistryStore::new(Arc::clone(&backend));
        Self {
            id,
            backend,
            store,
            bus,
            geometry,
            snapshot: LocalSnapshot::new(),
            config,
            state: Mutex::new(LifecycleState::NotStarted),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    /// The snapshot consumers should watch.
    pub fn snapshot(&self) -> &LocalSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Run the startup sequence at most once per process lifetime: register
    /// self, then start the position tracker, the change notifier, and the
    /// liveness sweep. Returns whether this call performed the start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state != LifecycleState::NotStarted {
                return false;
            }
            *state = LifecycleState::Starting;
        }

        let registry = self.store.register(&self.id, self.geometry.current());
        tracing::info!(id = %self.id, windows = registry.len(), "registered window");
        self.snapshot.publish(registry);

        self.tasks.spawn(tracker::run(
            self.id.clone(),
            self.store.clone(),
            Arc::clone(&self.geometry),
            self.snapshot.clone(),
            self.config.update_interval(),
            self.cancel.clone(),
        ));
        self.tasks.spawn(notifier::run(
            self.backend.watch_external(),
            self.snapshot.clone(),
            self.config.debounce(),
            self.cancel.clone(),
        ));
        self.tasks.spawn(liveness::run(
            self.id.clone(),
            Arc::clone(&self.bus),
            self.store.clone(),
            self.snapshot.clone(),
            self.config.sweep_delay(),
            self.cancel.clone(),
        ));

        {
            let mut state = self.state.lock();
            if *state == LifecycleState::Starting {
                *state = LifecycleState::Running;
            }
        }
        true
    }

    /// Activation gateway for visibility transitions: a window restored
    /// from a hidden state activates if the startup sequence has not
    /// already run. Hiding never tears anything down.
    pub fn handle_visibility(&self, visible: bool) -> bool {
        if visible {
            self.activate()
        } else {
            false
        }
    }

    /// Deterministic teardown, idempotent, safe on every exit path.
    ///
    /// Cancels and awaits all background activity first (an in-flight
    /// sweep whose deadline has not elapsed is discarded rather than
    /// allowed to write after we are gone), then closes the bus and removes
    /// this window's own entry. After this returns, no further store or
    /// bus writes originate from this node.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if *state == LifecycleState::Stopped {
                return;
            }
            *state = LifecycleState::Stopped;
        }

        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        self.bus.close();

        self.store.unregister(&self.id);
        tracing::info!(id = %self.id, "window node shut down");
    }
}
