//! Workflow executor
//!
//! Drives the ordered bin list through the per-bin pipeline as one spawned
//! unit of work per task. The executor owns task-level state transitions
//! and fails the task on the first bin failure; the state store is the only
//! channel back to whoever started the run.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::command::RobotCommander;
use crate::pipeline::{BinPipeline, DEFAULT_ARRIVAL_TIMEOUT};
use crate::stage::{CaptureStage, RecognitionStage};
use crate::store::{
    AuditLog, InventoryStore, OperationRecord, OperationType, SignalChannel, StoreError,
};
use crate::types::{BinPatch, BinState, RobotStatusEvent, Task, TaskState};

/// Configuration for the workflow executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Bound on each bin's robot arrival wait
    pub arrival_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            arrival_timeout: DEFAULT_ARRIVAL_TIMEOUT,
        }
    }
}

/// Result of a start request
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new workflow was created and spawned
    Started { task: Task },
    /// The task is already active; its current state is returned untouched
    AlreadyActive { task: Task },
}

/// WorkflowExecutor - one spawned workflow per task
#[derive(Clone)]
pub struct WorkflowExecutor {
    store: Arc<dyn InventoryStore>,
    signals: Arc<dyn SignalChannel>,
    commander: Arc<dyn RobotCommander>,
    audit: Arc<dyn AuditLog>,
    pipeline: BinPipeline,
}

impl WorkflowExecutor {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        signals: Arc<dyn SignalChannel>,
        capture: Arc<dyn CaptureStage>,
        recognition: Arc<dyn RecognitionStage>,
        commander: Arc<dyn RobotCommander>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self::with_config(
            store,
            signals,
            capture,
            recognition,
            commander,
            audit,
            ExecutorConfig::default(),
        )
    }

    pub fn with_config(
        store: Arc<dyn InventoryStore>,
        signals: Arc<dyn SignalChannel>,
        capture: Arc<dyn CaptureStage>,
        recognition: Arc<dyn RecognitionStage>,
        commander: Arc<dyn RobotCommander>,
        audit: Arc<dyn AuditLog>,
        config: ExecutorConfig,
    ) -> Self {
        let pipeline = BinPipeline::new(
            store.clone(),
            signals.clone(),
            capture,
            recognition,
            commander.clone(),
        )
        .with_arrival_timeout(config.arrival_timeout);
        Self {
            store,
            signals,
            commander,
            audit,
            pipeline,
        }
    }

    /// Start a workflow for the task and return immediately.
    ///
    /// The workflow body runs on a spawned tokio task. Starting an
    /// already-active task does not touch it; the caller gets its current
    /// state back. Starting over a terminal task replaces it.
    pub async fn start(
        &self,
        task_id: &str,
        bin_locations: Vec<String>,
    ) -> Result<StartOutcome, StoreError> {
        match self.store.create_task(task_id, &bin_locations).await {
            Ok(task) => {
                self.record_audit(
                    OperationRecord::new(OperationType::Inventory, "inventory task started")
                        .with_target(task_id)
                        .with_status("running")
                        .with_details(json!({
                            "task_no": task_id,
                            "bin_locations": bin_locations,
                            "bin_count": bin_locations.len(),
                        })),
                )
                .await;

                let executor = self.clone();
                let task_id = task_id.to_string();
                tokio::spawn(async move {
                    executor.run_workflow(task_id, bin_locations).await;
                });
                Ok(StartOutcome::Started { task })
            }
            Err(StoreError::AlreadyExists(_)) => {
                let snapshot = self.store.snapshot(task_id).await?;
                tracing::info!(
                    task_id = %task_id,
                    state = %snapshot.task.state,
                    "start requested for active task"
                );
                Ok(StartOutcome::AlreadyActive {
                    task: snapshot.task,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn run_workflow(&self, task_id: String, bin_locations: Vec<String>) {
        let total = bin_locations.len() as u32;
        tracing::info!(task_id = %task_id, bin_count = total, "inventory workflow started");

        if let Err(err) = self.store.transition_task(&task_id, TaskState::Running).await {
            tracing::error!(task_id = %task_id, error = %err, "failed to mark task running");
            return;
        }

        if let Err(err) = self
            .signals
            .publish(RobotStatusEvent::new("start", serde_json::Value::Null))
            .await
        {
            tracing::warn!(task_id = %task_id, error = %err, "failed to publish start signal");
        }

        match self.commander.submit_task(&task_id, &bin_locations).await {
            Ok(_) => tracing::info!(task_id = %task_id, "robot task submitted"),
            Err(err) => tracing::warn!(
                task_id = %task_id,
                error = %err,
                "robot task submission failed"
            ),
        }

        for (index, bin_location) in bin_locations.iter().enumerate() {
            let sequence = index as u32 + 1;
            tracing::info!(
                task_id = %task_id,
                bin_location = %bin_location,
                sequence = sequence,
                total = total,
                "processing bin"
            );

            if let Err(err) = self.store.set_current_step(&task_id, sequence).await {
                self.fail_task(&task_id, sequence, &err.to_string()).await;
                return;
            }
            if let Err(err) = self
                .store
                .update_bin(
                    &task_id,
                    sequence,
                    BinPatch::new().with_state(BinState::Running),
                )
                .await
            {
                self.fail_task(&task_id, sequence, &err.to_string()).await;
                return;
            }

            if let Err(err) = self
                .pipeline
                .process(&task_id, bin_location, sequence, total)
                .await
            {
                self.fail_task(&task_id, sequence, &err.to_string()).await;
                return;
            }
        }

        if let Err(err) = self.store.set_current_step(&task_id, total).await {
            tracing::error!(task_id = %task_id, error = %err, "failed to record final step");
        }
        if let Err(err) = self
            .store
            .transition_task(&task_id, TaskState::Completed)
            .await
        {
            tracing::error!(task_id = %task_id, error = %err, "failed to mark task completed");
            return;
        }
        self.record_audit(
            OperationRecord::new(OperationType::Inventory, "inventory task completed")
                .with_target(task_id.as_str())
                .with_status("completed")
                .with_details(json!({
                    "task_no": task_id,
                    "completed_count": total,
                })),
        )
        .await;
        tracing::info!(task_id = %task_id, bin_count = total, "inventory workflow completed");
    }

    async fn fail_task(&self, task_id: &str, failed_at_step: u32, error: &str) {
        if let Err(err) = self.store.transition_task(task_id, TaskState::Failed).await {
            tracing::error!(task_id = %task_id, error = %err, "failed to mark task failed");
        }
        self.record_audit(
            OperationRecord::new(OperationType::Inventory, "inventory task failed")
                .with_target(task_id)
                .with_status("failed")
                .with_details(json!({
                    "task_no": task_id,
                    "error": error,
                    "failed_at_step": failed_at_step,
                })),
        )
        .await;
        tracing::error!(
            task_id = %task_id,
            failed_at_step = failed_at_step,
            error = %error,
            "inventory workflow failed"
        );
    }

    async fn record_audit(&self, record: OperationRecord) {
        if let Err(err) = self.audit.record(record).await {
            tracing::warn!(error = %err, "failed to record operation log entry");
        }
    }
}
