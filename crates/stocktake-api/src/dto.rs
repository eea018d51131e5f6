//! Wire types for the inventory HTTP surface
//!
//! Field names follow the camelCase convention of the warehouse UI and the
//! robot control system, which both predate this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stocktake_core::store::OperationRecord;
use stocktake_core::types::{BinRecord, BinState, TaskSnapshot, TaskState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInventoryRequest {
    pub task_no: String,
    #[serde(default)]
    pub bin_locations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInventoryResponse {
    pub task_no: String,
    pub status: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinProgressView {
    pub bin_location: String,
    pub sequence: u32,
    pub status: BinState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&BinRecord> for BinProgressView {
    fn from(record: &BinRecord) -> Self {
        Self {
            bin_location: record.bin_location.clone(),
            sequence: record.sequence,
            status: record.state,
            compute_result: record.compute_result.clone(),
            capture_time: record.capture_time,
            recognition_time: record.recognition_time,
            end_time: record.ended_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressView {
    pub task_no: String,
    pub status: TaskState,
    pub current_step: u32,
    pub total_steps: u32,
    pub progress_percentage: f64,
    pub bin_locations: Vec<BinProgressView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&TaskSnapshot> for TaskProgressView {
    fn from(snapshot: &TaskSnapshot) -> Self {
        Self {
            task_no: snapshot.task.id.clone(),
            status: snapshot.task.state,
            current_step: snapshot.task.current_step,
            total_steps: snapshot.task.total_steps,
            progress_percentage: snapshot.progress_percentage,
            bin_locations: snapshot.bins.iter().map(BinProgressView::from).collect(),
            start_time: snapshot.task.started_at,
            end_time: snapshot.task.ended_at,
        }
    }
}

/// Inbound robot status report.
///
/// `extra` is a JSON-encoded string (not an object) carrying a list of
/// status items; that is how the control system sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotReportRequest {
    #[serde(default)]
    pub robot_task_code: Option<String>,
    #[serde(default)]
    pub single_robot_code: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
}

/// Fixed acknowledgment envelope the robot control system expects back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotReportAck {
    pub code: String,
    pub message: String,
    pub data: Value,
}

impl Default for RobotReportAck {
    fn default() -> Self {
        Self {
            code: "SUCCESS".to_string(),
            message: "成功".to_string(),
            data: serde_json::json!({"robotTaskCode": "ctu001"}),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation_type: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub status: String,
    pub details: Value,
}

impl From<&OperationRecord> for OperationView {
    fn from(record: &OperationRecord) -> Self {
        Self {
            id: record.id.clone(),
            timestamp: record.timestamp,
            operation_type: record.operation_type.to_string(),
            action: record.action.clone(),
            target: record.target.clone(),
            status: record.status.clone(),
            details: record.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOperationsView {
    pub operations: Vec<OperationView>,
    pub total: usize,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocktake_core::types::Task;

    #[test]
    fn test_progress_view_uses_camel_case_wire_names() {
        let snapshot = TaskSnapshot::new(
            Task::new("T001", 2),
            vec![BinRecord::new("A-01", 1), BinRecord::new("A-02", 2)],
        );
        let json = serde_json::to_value(TaskProgressView::from(&snapshot)).unwrap();
        assert_eq!(json["taskNo"], "T001");
        assert_eq!(json["totalSteps"], 2);
        assert_eq!(json["binLocations"][0]["binLocation"], "A-01");
        assert!(json.get("task_no").is_none());
    }

    #[test]
    fn test_report_ack_envelope_is_fixed() {
        let json = serde_json::to_value(RobotReportAck::default()).unwrap();
        assert_eq!(json["code"], "SUCCESS");
        assert_eq!(json["message"], "成功");
        assert_eq!(json["data"]["robotTaskCode"], "ctu001");
    }

    #[test]
    fn test_start_request_tolerates_missing_bin_list() {
        let req: StartInventoryRequest = serde_json::from_str(r#"{"taskNo":"T001"}"#).unwrap();
        assert_eq!(req.task_no, "T001");
        assert!(req.bin_locations.is_empty());
    }
}
