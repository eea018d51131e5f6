//! Bin record types
//!
//! A bin record tracks one location within a task, identified by its
//! 1-based position in the submission order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Per-bin processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinState {
    /// Not reached yet
    Pending,
    /// Currently being processed
    Running,
    /// Processed successfully
    Completed,
    /// Processing failed; the task aborts after this bin
    Failed,
}

impl BinState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BinState::Completed | BinState::Failed)
    }
}

impl fmt::Display for BinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinState::Pending => "pending",
            BinState::Running => "running",
            BinState::Completed => "completed",
            BinState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One bin location within a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinRecord {
    /// Warehouse location code, e.g. `A-01-02`
    pub bin_location: String,
    /// 1-based position in submission order
    pub sequence: u32,
    /// Current processing state
    pub state: BinState,
    pub image_data: Option<Value>,
    pub compute_result: Option<Value>,
    pub detect_result: Option<Value>,
    pub barcode_result: Option<Value>,
    pub capture_time: Option<DateTime<Utc>>,
    pub compute_time: Option<DateTime<Utc>>,
    pub recognition_time: Option<DateTime<Utc>>,
    /// Set when the bin reaches a terminal state
    pub ended_at: Option<DateTime<Utc>>,
}

impl BinRecord {
    /// Create a pending record for a location
    pub fn new(bin_location: impl Into<String>, sequence: u32) -> Self {
        Self {
            bin_location: bin_location.into(),
            sequence,
            state: BinState::Pending,
            image_data: None,
            compute_result: None,
            detect_result: None,
            barcode_result: None,
            capture_time: None,
            compute_time: None,
            recognition_time: None,
            ended_at: None,
        }
    }

    /// Apply a partial update; only populated patch fields are written
    pub fn apply(&mut self, patch: BinPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(v) = patch.image_data {
            self.image_data = Some(v);
        }
        if let Some(v) = patch.compute_result {
            self.compute_result = Some(v);
        }
        if let Some(v) = patch.detect_result {
            self.detect_result = Some(v);
        }
        if let Some(v) = patch.barcode_result {
            self.barcode_result = Some(v);
        }
        if let Some(t) = patch.capture_time {
            self.capture_time = Some(t);
        }
        if let Some(t) = patch.compute_time {
            self.compute_time = Some(t);
        }
        if let Some(t) = patch.recognition_time {
            self.recognition_time = Some(t);
        }
        if let Some(t) = patch.ended_at {
            self.ended_at = Some(t);
        }
    }
}

/// Partial update for a bin record
#[derive(Debug, Clone, Default)]
pub struct BinPatch {
    pub state: Option<BinState>,
    pub image_data: Option<Value>,
    pub compute_result: Option<Value>,
    pub detect_result: Option<Value>,
    pub barcode_result: Option<Value>,
    pub capture_time: Option<DateTime<Utc>>,
    pub compute_time: Option<DateTime<Utc>>,
    pub recognition_time: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl BinPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: BinState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_image_data(mut self, value: Value) -> Self {
        self.image_data = Some(value);
        self
    }

    pub fn with_compute_result(mut self, value: Value) -> Self {
        self.compute_result = Some(value);
        self
    }

    pub fn with_detect_result(mut self, value: Value) -> Self {
        self.detect_result = Some(value);
        self
    }

    pub fn with_barcode_result(mut self, value: Value) -> Self {
        self.barcode_result = Some(value);
        self
    }

    pub fn with_capture_time(mut self, time: DateTime<Utc>) -> Self {
        self.capture_time = Some(time);
        self
    }

    pub fn with_compute_time(mut self, time: DateTime<Utc>) -> Self {
        self.compute_time = Some(time);
        self
    }

    pub fn with_recognition_time(mut self, time: DateTime<Utc>) -> Self {
        self.recognition_time = Some(time);
        self
    }

    pub fn with_ended_at(mut self, time: DateTime<Utc>) -> Self {
        self.ended_at = Some(time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_is_pending_and_empty() {
        let record = BinRecord::new("A-01-02", 1);
        assert_eq!(record.state, BinState::Pending);
        assert_eq!(record.sequence, 1);
        assert!(record.image_data.is_none());
        assert!(record.ended_at.is_none());
    }

    #[test]
    fn test_patch_applies_only_populated_fields() {
        let mut record = BinRecord::new("A-01-02", 1);
        record.compute_result = Some(json!({"count": 3}));

        record.apply(
            BinPatch::new()
                .with_state(BinState::Running)
                .with_image_data(json!({"path": "/tmp/img.png"})),
        );

        assert_eq!(record.state, BinState::Running);
        assert_eq!(record.image_data, Some(json!({"path": "/tmp/img.png"})));
        // untouched by the patch
        assert_eq!(record.compute_result, Some(json!({"count": 3})));
        assert!(record.capture_time.is_none());
    }
}
