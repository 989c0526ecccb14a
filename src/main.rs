//! winmesh - shared window-registry synchronization.
//!
//! Runs one window node: registers itself in the shared store, tracks its
//! own viewport, answers liveness pings, and evicts peers that stopped
//! answering. Peers on the same machine share the store directory and list
//! each other's datagram addresses.
//!
//! Rendering is left to real embedders; this shell logs registry changes
//! instead of drawing them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use winmesh::bus::UdpBus;
use winmesh::config::SyncConfig;
use winmesh::geometry::TerminalGeometry;
use winmesh::lifecycle::WindowNode;
use winmesh::registry::WindowId;
use winmesh::store::FsStore;

/// winmesh - shared window-registry synchronization.
///
/// Start one instance per window. All instances of a session must point at
/// the same --store-dir; give each instance the others' bus addresses via
/// --peer so liveness pings can reach them.
#[derive(Parser, Debug)]
#[command(name = "winmesh", version, about, long_about = None)]
struct Cli {
    /// Directory holding the shared registry files
    #[arg(long, env = "WINMESH_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Address to bind the peer datagram socket
    #[arg(long, default_value = "127.0.0.1:0")]
    bind: SocketAddr,

    /// Peer datagram address (repeatable)
    #[arg(long = "peer")]
    peers: Vec<SocketAddr>,

    /// Window origin in the shared coordinate space
    #[arg(long, default_value_t = 0)]
    x: i32,

    /// Window origin in the shared coordinate space
    #[arg(long, default_value_t = 0)]
    y: i32,

    /// Stable window id (defaults to a fresh UUID)
    #[arg(long)]
    id: Option<String>,

    /// Path to a TOML timing config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the geometry sampling period (milliseconds)
    #[arg(long)]
    update_interval_ms: Option<u64>,

    /// Override the change-notification debounce window (milliseconds)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Override the liveness sweep deadline (milliseconds)
    #[arg(long)]
    sweep_delay_ms: Option<u64>,

    /// Override the store poll period (milliseconds)
    #[arg(long)]
    store_poll_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?.unwrap_or_else(|| {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            SyncConfig::default()
        }),
        None => SyncConfig::default(),
    };
    if let Some(ms) = cli.update_interval_ms {
        config.update_interval_ms = ms;
    }
    if let Some(ms) = cli.debounce_ms {
        config.debounce_ms = ms;
    }
    if let Some(ms) = cli.sweep_delay_ms {
        config.sweep_delay_ms = ms;
    }
    if let Some(ms) = cli.store_poll_ms {
        config.store_poll_ms = ms;
    }

    let store_dir = cli
        .store_dir
        .clone()
        .or_else(default_store_dir)
        .context("could not determine a store directory; pass --store-dir")?;
    let store = FsStore::open(&store_dir, config.store_poll())?;

    let bus = UdpBus::bind(cli.bind, cli.peers.clone()).await?;
    if let Some(addr) = bus.local_addr() {
        tracing::info!(%addr, peers = cli.peers.len(), "bus bound");
    }

    let id = cli
        .id
        .clone()
        .map(WindowId::from)
        .unwrap_or_else(WindowId::generate);
    tracing::info!(%id, store = %store_dir.display(), "starting window node");

    let node = WindowNode::new(
        id,
        Arc::new(store),
        Arc::new(bus),
        Arc::new(TerminalGeometry::new(cli.x, cli.y)),
        config,
    );
    node.activate();

    let mut snapshot = node.snapshot().subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshot.changed() => {
                if changed.is_err() {
                    break;
                }
                let registry = snapshot.borrow_and_update().clone();
                let mut ids: Vec<String> = registry.ids().map(|id| id.to_string()).collect();
                ids.sort();
                tracing::info!(windows = registry.len(), ids = %ids.join(","), "registry updated");
            }
        }
    }

    tracing::info!("shutting down");
    node.shutdown().await;
    Ok(())
}

fn default_store_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("winmesh"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "winmesh=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
