//! # Stocktake Core
//!
//! Core abstractions and orchestration logic for the stocktake inventory
//! system.
//!
//! This crate contains:
//! - Data model: `Task`, `BinRecord`, `RobotStatusEvent`, `TaskSnapshot`
//! - Storage abstractions: `InventoryStore`, `SignalChannel`, `AuditLog`
//! - Collaborator seams: `CaptureStage`, `RecognitionStage`, `RobotCommander`
//! - The per-bin pipeline and the workflow executor
//!
//! This crate does NOT know:
//! - How robot signals arrive (the HTTP ingress lives in the server)
//! - How capture or recognition actually run (stocktake-stages)
//! - How progress is presented to clients (stocktake-api)

pub mod command;
pub mod executor;
pub mod pipeline;
pub mod stage;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::command::{CommandAck, CommandError, RobotCommander};
    pub use crate::executor::{ExecutorConfig, StartOutcome, WorkflowExecutor};
    pub use crate::pipeline::{BinOutcome, BinPipeline, PipelineError};
    pub use crate::stage::{
        CaptureStage, CaptureStepResult, RecognitionError, RecognitionOutcome, RecognitionStage,
    };
    pub use crate::store::{
        AuditLog, InventoryStore, OperationRecord, OperationType, SignalChannel, SignalError,
        StoreError,
    };
    pub use crate::types::{
        BinPatch, BinRecord, BinState, RobotStatusEvent, Task, TaskId, TaskSnapshot, TaskState,
    };
}

// Re-export commonly used types at the root
pub use command::{CommandAck, CommandError, RobotCommander};
pub use executor::{ExecutorConfig, StartOutcome, WorkflowExecutor};
pub use pipeline::{BinOutcome, BinPipeline, PipelineError, DEFAULT_ARRIVAL_TIMEOUT};
pub use stage::{
    CaptureStage, CaptureStepResult, RecognitionError, RecognitionOutcome, RecognitionStage,
};
pub use store::{
    AuditLog, InventoryStore, OperationRecord, OperationType, SignalChannel, SignalError,
    StoreError,
};
pub use types::{BinPatch, BinRecord, BinState, RobotStatusEvent, Task, TaskId, TaskSnapshot, TaskState};
