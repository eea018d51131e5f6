//! Operation audit records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::StoreError;

/// Category of an operation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Inventory,
    UserLogin,
    UserManagement,
    SystemCleanup,
    Other,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::Inventory => "inventory",
            OperationType::UserLogin => "user_login",
            OperationType::UserManagement => "user_management",
            OperationType::SystemCleanup => "system_cleanup",
            OperationType::Other => "other",
        };
        f.write_str(name)
    }
}

/// One recorded operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// `YYYYMMDD_HHMMSS_` plus the last three digits of the millisecond
    /// clock; unique enough for a human-readable log
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation_type: OperationType,
    /// Short human-readable description of what happened
    pub action: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// What the operation acted on, e.g. a task id
    #[serde(default)]
    pub target: Option<String>,
    /// Outcome, e.g. `"success"` or `"failed"`
    pub status: String,
    #[serde(default)]
    pub details: Value,
}

impl OperationRecord {
    pub fn new(operation_type: OperationType, action: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_operation_id(now),
            timestamp: now,
            operation_type,
            action: action.into(),
            user_id: None,
            user_name: None,
            target: None,
            status: "success".to_string(),
            details: Value::Null,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

fn generate_operation_id(now: DateTime<Utc>) -> String {
    format!(
        "{}_{:03}",
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_millis().rem_euclid(1000)
    )
}

/// AuditLog trait - append-only operation history
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a record.
    async fn record(&self, record: OperationRecord) -> Result<(), StoreError>;

    /// Most recent records, newest first, restricted to the last `days`
    /// days and truncated to `limit` entries.
    async fn recent(&self, limit: usize, days: i64) -> Result<Vec<OperationRecord>, StoreError>;
}
