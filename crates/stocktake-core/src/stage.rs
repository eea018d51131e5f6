//! Capture and recognition collaborator seams
//!
//! Both stages are external collaborators defined only by their
//! input/output contract. Concrete implementations live in the
//! stocktake-stages crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result of a single capture sub-step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureStepResult {
    /// Sub-step name, e.g. the script file name
    pub script: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// Set when the sub-step never produced an exit status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureStepResult {
    pub fn ok(script: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            error: None,
        }
    }

    pub fn failed(script: impl Into<String>, exit_code: i32, error: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// CaptureStage trait - acquires raw imagery for one bin
///
/// The stage as a whole never fails: each sub-step carries its own success
/// flag and the sequence always runs to the end.
#[async_trait]
pub trait CaptureStage: Send + Sync {
    async fn capture(&self, task_id: &str, bin_location: &str) -> Vec<CaptureStepResult>;
}

/// Output of the recognition stage for one bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutcome {
    /// References to captured imagery
    pub image_data: Value,
    /// Derived counts and identifiers
    pub compute_result: Value,
    pub capture_time: Option<DateTime<Utc>>,
    pub compute_time: Option<DateTime<Utc>>,
}

/// Recognition stage errors
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("recognition service error: {0}")]
    Service(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// RecognitionStage trait - derives inventory results from captured imagery
#[async_trait]
pub trait RecognitionStage: Send + Sync {
    async fn recognize(
        &self,
        task_id: &str,
        bin_location: &str,
    ) -> Result<RecognitionOutcome, RecognitionError>;
}
