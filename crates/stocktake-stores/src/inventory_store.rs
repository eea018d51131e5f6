//! InventoryStore in-memory implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

use stocktake_core::store::{InventoryStore, StoreError};
use stocktake_core::types::{BinPatch, BinRecord, Task, TaskSnapshot, TaskState};

struct TaskEntry {
    task: Task,
    bins: Vec<BinRecord>,
    details: HashMap<String, Value>,
}

/// In-memory implementation backed by one RwLock over all tasks.
///
/// The write lock is held only for the duration of a single mutation, so a
/// concurrent snapshot always observes fully applied updates.
pub struct InMemoryInventoryStore {
    tasks: RwLock<HashMap<String, TaskEntry>>,
}

impl InMemoryInventoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn create_task(
        &self,
        task_id: &str,
        bin_locations: &[String],
    ) -> Result<Task, StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if let Some(entry) = tasks.get(task_id) {
            if entry.task.state.is_active() {
                return Err(StoreError::AlreadyExists(task_id.to_string()));
            }
        }
        let task = Task::new(task_id, bin_locations.len() as u32);
        let bins = bin_locations
            .iter()
            .enumerate()
            .map(|(i, loc)| BinRecord::new(loc.clone(), i as u32 + 1))
            .collect();
        tasks.insert(
            task_id.to_string(),
            TaskEntry {
                task: task.clone(),
                bins,
                details: HashMap::new(),
            },
        );
        Ok(task)
    }

    async fn transition_task(&self, task_id: &str, to: TaskState) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        if !entry.task.state.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                from: entry.task.state,
                to,
            });
        }
        entry.task.set_state(to);
        Ok(())
    }

    async fn set_current_step(&self, task_id: &str, step: u32) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        entry.task.set_current_step(step);
        Ok(())
    }

    async fn update_bin(
        &self,
        task_id: &str,
        sequence: u32,
        patch: BinPatch,
    ) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        let bin = entry
            .bins
            .iter_mut()
            .find(|b| b.sequence == sequence)
            .ok_or_else(|| StoreError::BinNotFound {
                task_id: task_id.to_string(),
                sequence,
            })?;
        bin.apply(patch);
        entry.task.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn update_bin_by_location(
        &self,
        task_id: &str,
        bin_location: &str,
        patch: BinPatch,
    ) -> Result<bool, StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        // first occurrence only; duplicate locations in one task keep their
        // later records untouched
        match entry
            .bins
            .iter_mut()
            .find(|b| b.bin_location == bin_location)
        {
            Some(bin) => {
                bin.apply(patch);
                entry.task.updated_at = chrono::Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn snapshot(&self, task_id: &str) -> Result<TaskSnapshot, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        Ok(TaskSnapshot::new(entry.task.clone(), entry.bins.clone()))
    }

    async fn set_bin_detail(
        &self,
        task_id: &str,
        bin_location: &str,
        detail: Value,
    ) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        entry.details.insert(bin_location.to_string(), detail);
        Ok(())
    }

    async fn bin_detail(
        &self,
        task_id: &str,
        bin_location: &str,
    ) -> Result<Option<Value>, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let entry = tasks
            .get(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        Ok(entry.details.get(bin_location).cloned())
    }
}
