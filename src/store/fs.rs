//! Filesystem-backed store: one JSON blob per key under a shared directory.
//!
//! Other processes' writes are detected by a timer-driven polling task that
//! compares file contents against the last observed value. Polling rather
//! than a change event: no portable cross-process notification exists for
//! "another process rewrote a file", and the blobs are small enough that a
//! short poll interval is cheap.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{StoreBackend, StoreError, StoreEvent, EVENT_CAPACITY};

/// Shared directory of `<key>.json` files, with a background poll task
/// surfacing writes made by other processes. Dropping the store stops the
/// task.
pub struct FsStore {
    inner: Arc<Inner>,
    _poll_guard: DropGuard,
}

struct Inner {
    dir: PathBuf,
    /// Last value this handle wrote per key. A polled change equal to it is
    /// our own write echoing back and must not fire an event.
    last_written: Mutex<HashMap<String, Bytes>>,
    tx: broadcast::Sender<StoreEvent>,
}

impl FsStore {
    /// Open a store rooted at `dir`, creating the directory if needed, and
    /// start the polling task. Must be called from within a tokio runtime.
    pub fn open(dir: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| StoreError::CreateDir(dir.clone(), err))?;

        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Arc::new(Inner {
            dir,
            last_written: Mutex::new(HashMap::new()),
            tx,
        });

        let cancel = CancellationToken::new();
        tokio::spawn(poll_loop(Arc::clone(&inner), poll_interval, cancel.clone()));

        Ok(Self {
            inner,
            _poll_guard: cancel.drop_guard(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{key}.json"))
    }
}

impl StoreBackend for FsStore {
    fn read(&self, key: &str) -> Option<Bytes> {
        let path = Self::path_for(&self.inner.dir, key);
        match std::fs::read(&path) {
            Ok(raw) => Some(Bytes::from(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "store read failed");
                None
            }
        }
    }

    fn write(&self, key: &str, value: Bytes) {
        self.inner
            .last_written
            .lock()
            .insert(key.to_string(), value.clone());

        let path = Self::path_for(&self.inner.dir, key);
        if let Err(err) = std::fs::write(&path, &value) {
            tracing::warn!(path = %path.display(), %err, "store write failed");
        }
    }

    fn watch_external(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.tx.subscribe()
    }
}

async fn poll_loop(inner: Arc<Inner>, poll_interval: Duration, cancel: CancellationToken) {
    // Seed with the current contents so values that predate this process do
    // not fire as changes.
    let mut seen = scan(&inner.dir);

    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        for (key, value) in scan(&inner.dir) {
            if seen.get(&key) == Some(&value) {
                continue;
            }
            seen.insert(key.clone(), value.clone());

            // A peer write byte-identical to our own last write is
            // indistinguishable from our echo; dropping it loses nothing.
            if inner.last_written.lock().get(&key) == Some(&value) {
                continue;
            }

            tracing::trace!(%key, "external store write detected");
            let _ = inner.tx.send(StoreEvent { key, value });
        }
    }
}

/// Read every `<key>.json` file under `dir`. Unreadable entries are skipped.
fn scan(dir: &Path) -> HashMap<String, Bytes> {
    let mut out = HashMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), %err, "store scan failed");
            return out;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if let Ok(raw) = std::fs::read(&path) {
            out.insert(key.to_string(), Bytes::from(raw));
        }
    }
    out
}
