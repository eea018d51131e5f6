//! HTTP recognition stage implementation.
//!
//! This module provides a client for the vision service's processing API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stocktake_core::stage::{RecognitionError, RecognitionOutcome, RecognitionStage};

/// Recognition service client configuration.
#[derive(Debug, Clone)]
pub struct RecognitionClientConfig {
    /// Base endpoint URL of the vision service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RecognitionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8004".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Recognition stage backed by the vision service's HTTP API.
pub struct HttpRecognition {
    client: reqwest::Client,
    config: RecognitionClientConfig,
}

impl HttpRecognition {
    /// Create a new client.
    pub fn new(config: RecognitionClientConfig) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self) -> String {
        format!("{}/api/vision/process", self.config.base_url)
    }
}

// Vision service request/response structures

#[derive(Debug, Serialize)]
struct ProcessRequest {
    #[serde(rename = "taskNo")]
    task_no: String,
    #[serde(rename = "binLocation")]
    bin_location: String,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    #[serde(rename = "imageData")]
    image_data: Option<Value>,
    #[serde(rename = "captureTime")]
    capture_time: Option<DateTime<Utc>>,
    #[serde(rename = "computeResult")]
    compute_result: Option<Value>,
    #[serde(rename = "computeTime")]
    compute_time: Option<DateTime<Utc>>,
    error: Option<String>,
}

#[async_trait]
impl RecognitionStage for HttpRecognition {
    async fn recognize(
        &self,
        task_id: &str,
        bin_location: &str,
    ) -> Result<RecognitionOutcome, RecognitionError> {
        let url = self.build_url();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = ProcessRequest {
            task_no: task_id.to_string(),
            bin_location: bin_location.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognitionError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Service(format!("HTTP {}: {}", status, text)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RecognitionError::Http(e.to_string()))?;

        let parsed: ProcessResponse = serde_json::from_str(&text)
            .map_err(|e| RecognitionError::Serialization(e.to_string()))?;

        // Check for a service-level error
        if let Some(error) = parsed.error {
            return Err(RecognitionError::Service(error));
        }

        Ok(RecognitionOutcome {
            image_data: parsed.image_data.unwrap_or(Value::Null),
            compute_result: parsed.compute_result.unwrap_or(Value::Null),
            capture_time: parsed.capture_time,
            compute_time: parsed.compute_time,
        })
    }
}
