//! Robot status signal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One robot status signal, as published to the signal channel
///
/// `method` is a free-form tag from the robot feed; the values seen in
/// practice are `"start"`, `"outbin"` and `"end"`, but consumers must not
/// assume a closed set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotStatusEvent {
    /// Status tag, e.g. `"end"` when the robot arrives at a bin
    pub method: String,
    /// Opaque data reported alongside the status
    pub payload: Value,
    /// When the orchestrator observed the signal
    pub observed_at: DateTime<Utc>,
}

impl RobotStatusEvent {
    pub fn new(method: impl Into<String>, payload: Value) -> Self {
        Self {
            method: method.into(),
            payload,
            observed_at: Utc::now(),
        }
    }
}
