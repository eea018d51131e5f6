//! # Stocktake Stores
//!
//! In-memory implementations of the storage abstractions defined in
//! stocktake-core: the inventory store, the robot signal channel, and the
//! operation audit log.
//!
//! Every implementation is process-local; nothing survives a restart. The
//! deployment runs one orchestrator process, so the signal channel never
//! needs to cross a process boundary either.

mod audit_log;
mod inventory_store;
mod signal_channel;

pub use audit_log::InMemoryAuditLog;
pub use inventory_store::InMemoryInventoryStore;
pub use signal_channel::InProcessSignalChannel;

// Re-export the trait surface for convenience.
pub use stocktake_core::store::{AuditLog, InventoryStore, SignalChannel, StoreError};
