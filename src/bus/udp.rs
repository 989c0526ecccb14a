//! UDP datagram transport for cross-process deployments.
//!
//! Each process binds its own socket and publishes to a static peer list,
//! one JSON datagram per peer. Datagrams inherit exactly the contract the
//! bus promises: unordered, at-most-once, lost under load, gone if nobody
//! is listening.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::{Bus, BUS_CAPACITY};
use crate::protocol::SyncMessage;

/// Sync messages are a few dozen bytes; anything near this size is noise.
const RECV_BUFFER: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to bind udp socket on {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
}

/// Datagram bus endpoint with a static (but extendable) peer list.
pub struct UdpBus {
    socket: Arc<UdpSocket>,
    peers: RwLock<Vec<SocketAddr>>,
    tx: broadcast::Sender<SyncMessage>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl UdpBus {
    /// Bind a local socket and start the receive task. Must be called from
    /// within a tokio runtime.
    pub async fn bind(local: SocketAddr, peers: Vec<SocketAddr>) -> Result<Self, BusError> {
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|err| BusError::Bind(local, err))?;
        let socket = Arc::new(socket);

        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        let cancel = CancellationToken::new();
        tokio::spawn(recv_loop(
            Arc::clone(&socket),
            tx.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            socket,
            peers: RwLock::new(peers),
            tx,
            closed: AtomicBool::new(false),
            cancel,
        })
    }

    /// The bound local address, for advertising to peers.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    pub fn add_peer(&self, addr: SocketAddr) {
        self.peers.write().push(addr);
    }
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    tx: broadcast::Sender<SyncMessage>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; RECV_BUFFER];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, from)) => match SyncMessage::decode(&buf[..len]) {
                    Ok(msg) => {
                        let _ = tx.send(msg);
                    }
                    Err(err) => {
                        tracing::debug!(%from, %err, "dropping undecodable datagram");
                    }
                },
                Err(err) => {
                    tracing::debug!(%err, "udp recv failed");
                }
            }
        }
    }
}

impl Bus for UdpBus {
    fn publish(&self, msg: &SyncMessage) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let data = match msg.encode() {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(%err, "failed to encode sync message");
                return;
            }
        };
        for peer in self.peers.read().iter() {
            if let Err(err) = self.socket.try_send_to(&data, *peer) {
                tracing::debug!(%peer, %err, "udp send failed");
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.tx.subscribe()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();
    }
}

impl Drop for UdpBus {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
