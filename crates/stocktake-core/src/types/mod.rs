//! Core data model for the stocktake orchestrator

mod bin;
mod signal;
mod snapshot;
mod task;

pub use bin::{BinPatch, BinRecord, BinState};
pub use signal::RobotStatusEvent;
pub use snapshot::TaskSnapshot;
pub use task::{Task, TaskId, TaskState};
