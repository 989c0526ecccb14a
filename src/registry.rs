//! The shared window registry and its durable operations.
//!
//! The registry is one JSON blob in the shared store, mapping window id to
//! entry. Every mutation is a full read-modify-write cycle with no locking:
//! last writer wins across the whole collection. Corrupt stored data is
//! replaced with an empty registry rather than surfaced as an error, so a
//! poisoned store can never take a window down.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::WindowRect;
use crate::store::StoreBackend;

/// Store key holding the serialized registry.
pub const REGISTRY_KEY: &str = "windows";

/// Store key holding the registration counter.
pub const COUNTER_KEY: &str = "counter";

/// Bright, high-contrast colors assigned to windows by registration order.
pub const PALETTE: [&str; 8] = [
    "red", "lime", "yellow", "magenta", "white", "aqua", "blue", "orange",
];

/// Opaque window identifier, generated once per process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    /// Mint a fresh id for this process.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One window's registration record: its geometry plus the color it was
/// assigned when it first registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: String,
}

impl WindowEntry {
    pub fn new(rect: WindowRect, color: impl Into<String>) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            color: color.into(),
        }
    }

    pub fn rect(&self) -> WindowRect {
        WindowRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Merge new geometry, keeping the color.
    fn apply(&mut self, rect: WindowRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

/// The full shared mapping from window id to entry. Insertion order is
/// irrelevant; ids are unique by construction of the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: HashMap<WindowId, WindowEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &WindowId) -> Option<&WindowEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &WindowId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: WindowId, entry: WindowEntry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: &WindowId) -> Option<WindowEntry> {
        self.entries.remove(id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&WindowId) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WindowId, &WindowEntry)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WindowId> {
        self.entries.keys()
    }
}

/// Typed registry operations over a shared store backend.
///
/// Nothing here returns an error: decode failures fall back to an empty
/// registry (healing the stored blob where the contract calls for it) and
/// I/O failures are logged by the backend and swallowed. Callers always get
/// a usable registry back.
#[derive(Clone)]
pub struct RegistryStore {
    backend: Arc<dyn StoreBackend>,
}

impl RegistryStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Read the full registry. A missing blob is an empty registry; a
    /// corrupt blob is replaced with an empty registry in the store before
    /// returning, so the corruption never outlives one read.
    pub fn read_all(&self) -> Registry {
        let Some(raw) = self.backend.read(REGISTRY_KEY) else {
            return Registry::new();
        };
        match serde_json::from_slice(&raw) {
            Ok(registry) => registry,
            Err(err) => {
                tracing::warn!(%err, "stored registry is corrupt, resetting to empty");
                let empty = Registry::new();
                self.write_all(&empty);
                empty
            }
        }
    }

    /// Persist the full registry.
    pub fn write_all(&self, registry: &Registry) {
        match serde_json::to_vec(registry) {
            Ok(raw) => self.backend.write(REGISTRY_KEY, Bytes::from(raw)),
            Err(err) => tracing::warn!(%err, "failed to serialize registry"),
        }
    }

    /// Read the registration counter. Missing or corrupt values read as 0.
    pub fn read_counter(&self) -> u64 {
        let Some(raw) = self.backend.read(COUNTER_KEY) else {
            return 0;
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "stored counter is corrupt, treating as 0");
                0
            }
        }
    }

    pub fn write_counter(&self, value: u64) {
        match serde_json::to_vec(&value) {
            Ok(raw) => self.backend.write(COUNTER_KEY, Bytes::from(raw)),
            Err(err) => tracing::warn!(%err, "failed to serialize counter"),
        }
    }

    /// Register `id` with the given geometry, assigning
    /// `PALETTE[counter % PALETTE.len()]` and bumping the counter. An id
    /// already present is overwritten; other entries are untouched. Returns
    /// the full registry after the write.
    pub fn register(&self, id: &WindowId, rect: WindowRect) -> Registry {
        let counter = self.read_counter();
        let color = PALETTE[(counter as usize) % PALETTE.len()];
        self.write_counter(counter + 1);

        let mut registry = self.read_all();
        registry.insert(id.clone(), WindowEntry::new(rect, color));
        self.write_all(&registry);
        registry
    }

    /// Remove `id` if present. An unreadable store acts as an empty one, so
    /// this is a no-op deletion from nothing.
    pub fn unregister(&self, id: &WindowId) -> Registry {
        let mut registry = self.read_all();
        registry.remove(id);
        self.write_all(&registry);
        registry
    }

    /// Merge new geometry into the entry for `id`, preserving its color.
    ///
    /// A missing entry (evicted by a peer's sweep between our writes) is
    /// re-inserted with the first palette color; the window reappears but
    /// its prior color identity is lost.
    pub fn update_entry(&self, id: &WindowId, rect: WindowRect) -> Registry {
        let mut registry = self.read_all();
        match registry.entries.get_mut(id) {
            Some(entry) => entry.apply(rect),
            None => {
                registry.insert(id.clone(), WindowEntry::new(rect, PALETTE[0]));
            }
        }
        self.write_all(&registry);
        registry
    }

    /// Drop every entry whose id is not in `alive` and persist the result.
    pub fn prune(&self, alive: &HashSet<WindowId>) -> Registry {
        let mut registry = self.read_all();
        registry.retain(|id| alive.contains(id));
        self.write_all(&registry);
        registry
    }
}
