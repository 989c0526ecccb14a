//! Messages exchanged between windows on the broadcast bus.
//!
//! Wire format: JSON tagged unions, e.g. `{"type": "ping", "id": "..."}`.
//! Delivery is best-effort: unordered, at-most-once, never persisted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::registry::WindowId;

/// A liveness probe or its reply.
///
/// `Ping` asks every listening window to identify itself; any window
/// receiving a ping from a different id answers with `Pong`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyncMessage {
    Ping { id: WindowId },
    Pong { id: WindowId },
}

impl SyncMessage {
    /// Serialize for a datagram transport.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Parse a received payload. Callers drop undecodable payloads.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
