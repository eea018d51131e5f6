//! Inventory API service facade

use std::sync::Arc;

use serde_json::Value;

use stocktake_core::executor::{StartOutcome, WorkflowExecutor};
use stocktake_core::store::{AuditLog, InventoryStore, SignalChannel, StoreError};
use stocktake_core::types::RobotStatusEvent;

use crate::dto::{
    OperationView, RecentOperationsView, RobotReportAck, RobotReportRequest, StartInventoryRequest,
    StartInventoryResponse, TaskProgressView,
};
use crate::ApiError;

/// Default page size for the recent-operations query.
const DEFAULT_RECENT_LIMIT: usize = 5;
/// How far back the recent-operations query reaches.
const RECENT_WINDOW_DAYS: i64 = 180;

/// Service facade over the orchestrator's collaborators.
///
/// One instance is shared by every request handler; all state lives in the
/// store, the signal channel and the audit log behind it.
#[derive(Clone)]
pub struct InventoryApi {
    executor: WorkflowExecutor,
    store: Arc<dyn InventoryStore>,
    signals: Arc<dyn SignalChannel>,
    audit: Arc<dyn AuditLog>,
}

impl InventoryApi {
    pub fn new(
        executor: WorkflowExecutor,
        store: Arc<dyn InventoryStore>,
        signals: Arc<dyn SignalChannel>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            executor,
            store,
            signals,
            audit,
        }
    }

    /// Start an inventory run and return immediately.
    ///
    /// Starting a task that is already active does not touch it; the
    /// response carries its current status and a note saying so.
    pub async fn start_inventory(
        &self,
        request: StartInventoryRequest,
    ) -> Result<StartInventoryResponse, ApiError> {
        if request.task_no.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "taskNo must not be empty".to_string(),
            ));
        }
        if request.bin_locations.is_empty() {
            return Err(ApiError::InvalidArgument(
                "binLocations must not be empty".to_string(),
            ));
        }

        let outcome = self
            .executor
            .start(&request.task_no, request.bin_locations)
            .await
            .map_err(map_store_error)?;

        let response = match outcome {
            StartOutcome::Started { task } => StartInventoryResponse {
                task_no: task.id,
                status: task.state,
                message: None,
            },
            StartOutcome::AlreadyActive { task } => StartInventoryResponse {
                task_no: task.id,
                status: task.state,
                message: Some("task already active".to_string()),
            },
        };
        Ok(response)
    }

    /// Current task progress, readable at any time during the run.
    pub async fn progress(&self, task_no: &str) -> Result<TaskProgressView, ApiError> {
        let snapshot = self
            .store
            .snapshot(task_no)
            .await
            .map_err(map_store_error)?;
        Ok(TaskProgressView::from(&snapshot))
    }

    /// Most recently stored detail payload for a bin location.
    pub async fn task_detail(
        &self,
        task_no: &str,
        bin_location: &str,
    ) -> Result<Value, ApiError> {
        let detail = self
            .store
            .bin_detail(task_no, bin_location)
            .await
            .map_err(map_store_error)?;
        detail.ok_or_else(|| {
            ApiError::NotFound(format!(
                "no detail for task '{}' bin '{}'",
                task_no, bin_location
            ))
        })
    }

    /// Fan an inbound robot status report out to the signal channel.
    ///
    /// The control system batches status items into `extra` as a JSON
    /// string; every item is published under its own `method` tag. The
    /// report is acknowledged with the fixed envelope regardless of what
    /// it contained; an unparsable `extra` is logged, not rejected, since
    /// a non-200 would make the robot re-send forever.
    pub async fn report_robot_status(&self, request: RobotReportRequest) -> RobotReportAck {
        let extra = match request.extra.as_deref() {
            Some(extra) if !extra.trim().is_empty() => extra,
            _ => return RobotReportAck::default(),
        };

        let items: Vec<Value> = match serde_json::from_str(extra) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                tracing::error!(
                    robot_task_code = ?request.robot_task_code,
                    "robot report extra is not a list: {}",
                    other
                );
                return RobotReportAck::default();
            }
            Err(err) => {
                tracing::error!(
                    robot_task_code = ?request.robot_task_code,
                    error = %err,
                    "failed to parse robot report extra"
                );
                return RobotReportAck::default();
            }
        };

        for item in items {
            let method = match item.get("method").and_then(Value::as_str) {
                Some(method) => method.to_string(),
                None => {
                    tracing::warn!("robot status item without method: {}", item);
                    continue;
                }
            };
            tracing::info!(method = %method, "robot status received");
            if let Err(err) = self
                .signals
                .publish(RobotStatusEvent::new(method, item))
                .await
            {
                tracing::error!(error = %err, "failed to publish robot status");
            }
        }
        RobotReportAck::default()
    }

    /// Recent audit entries, newest first.
    pub async fn recent_operations(
        &self,
        limit: Option<usize>,
    ) -> Result<RecentOperationsView, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        let records = self
            .audit
            .recent(limit, RECENT_WINDOW_DAYS)
            .await
            .map_err(map_store_error)?;
        Ok(RecentOperationsView {
            total: records.len(),
            operations: records.iter().map(OperationView::from).collect(),
            limit,
        })
    }
}

fn map_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(id) => ApiError::NotFound(format!("task '{}' not found", id)),
        StoreError::AlreadyExists(id) => {
            ApiError::Conflict(format!("task '{}' already active", id))
        }
        other => ApiError::Internal(other.to_string()),
    }
}
