//! winmesh - shared window-registry synchronization.
//!
//! Several independent processes ("windows" of one logical session) agree on
//! a shared registry of who exists and where, with no central coordinator.
//! Two primitives carry everything: a persistent shared key-value store
//! ([`store`]) and a best-effort broadcast channel ([`bus`]). Each process
//! registers itself, publishes its own geometry as it moves, answers
//! liveness pings from peers, and evicts entries that stopped answering.
//!
//! The store has no atomic read-modify-write, so concurrent writers can
//! clobber each other. That is accepted: every participant periodically
//! resubmits state that is re-derivable (its own position), so lost updates
//! and false evictions are transient. The registry is eventually consistent,
//! never strictly consistent.

pub mod bus;
pub mod config;
pub mod geometry;
pub mod lifecycle;
pub mod liveness;
pub mod notifier;
pub mod protocol;
pub mod registry;
pub mod scene;
pub mod snapshot;
pub mod store;
pub mod tracker;
