//! Task and bin state store trait

use async_trait::async_trait;
use serde_json::Value;

use super::StoreError;
use crate::types::{BinPatch, Task, TaskSnapshot, TaskState};

/// InventoryStore trait - async interface for task and bin state
///
/// One store instance holds every task for the process lifetime. Mutations
/// are serialized per store; `snapshot` never observes a half-applied
/// update.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Create a task in `Init` state with one pending bin per location, in
    /// submission order.
    ///
    /// Fails with [`StoreError::AlreadyExists`] while a task with this id is
    /// active. A task in a terminal state is replaced from scratch.
    async fn create_task(
        &self,
        task_id: &str,
        bin_locations: &[String],
    ) -> Result<Task, StoreError>;

    /// Apply a task state transition.
    ///
    /// Only `Init -> Running -> {Completed, Failed}` is accepted; anything
    /// else fails with [`StoreError::InvalidTransition`].
    async fn transition_task(&self, task_id: &str, to: TaskState) -> Result<(), StoreError>;

    /// Record the 1-based sequence currently being processed.
    async fn set_current_step(&self, task_id: &str, step: u32) -> Result<(), StoreError>;

    /// Update exactly the bin at the given sequence position.
    async fn update_bin(
        &self,
        task_id: &str,
        sequence: u32,
        patch: BinPatch,
    ) -> Result<(), StoreError>;

    /// Update the first bin whose location matches.
    ///
    /// With duplicate locations in one task only the first occurrence is
    /// ever touched. Returns whether any bin was updated; no match is not
    /// an error.
    async fn update_bin_by_location(
        &self,
        task_id: &str,
        bin_location: &str,
        patch: BinPatch,
    ) -> Result<bool, StoreError>;

    /// Consistent copy of the task and all of its bin records.
    async fn snapshot(&self, task_id: &str) -> Result<TaskSnapshot, StoreError>;

    /// Store the detail payload for a bin location, replacing any previous
    /// payload for the same location.
    async fn set_bin_detail(
        &self,
        task_id: &str,
        bin_location: &str,
        detail: Value,
    ) -> Result<(), StoreError>;

    /// Most recently stored detail payload for a bin location.
    async fn bin_detail(
        &self,
        task_id: &str,
        bin_location: &str,
    ) -> Result<Option<Value>, StoreError>;
}
