//! Store module
//!
//! Storage abstractions for the orchestrator:
//! - InventoryStore: task and bin state persistence
//! - SignalChannel: single-slot, latest-wins robot status channel
//! - AuditLog: operation history
//!
//! Note: concrete implementations live in the stocktake-stores crate.

mod audit_log;
mod inventory_store;
mod signal_channel;

pub use audit_log::{AuditLog, OperationRecord, OperationType};
pub use inventory_store::InventoryStore;
pub use signal_channel::{SignalChannel, SignalError};

use thiserror::Error;

use crate::types::TaskState;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task already active: {0}")]
    AlreadyExists(String),

    #[error("Invalid task transition: {from} -> {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    #[error("Bin not found: task '{task_id}' has no sequence {sequence}")]
    BinNotFound { task_id: String, sequence: u32 },

    #[error("Internal store error: {0}")]
    Internal(String),
}
