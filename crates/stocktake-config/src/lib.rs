//! # Stocktake Config
//!
//! Unified single-file configuration for the stocktake orchestrator.
//! A single `stocktake.yaml` configures the robot control client, the
//! capture scripts, the recognition service, workflow timing, and
//! observability settings.

mod loader;

pub use loader::{apply_env_overrides, load_config, ConfigError};

use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration schema for the stocktake orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct StocktakeConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for StocktakeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            robot: RobotConfig::default(),
            capture: CaptureConfig::default(),
            recognition: RecognitionConfig::default(),
            workflow: WorkflowConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "stocktake".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Robot control system endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RobotConfig {
    #[serde(default = "default_robot_base_url")]
    pub base_url: String,
    /// Optional path prefix mounted in front of the control system API.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_robot_request_id")]
    pub request_id: String,
    #[serde(default = "default_robot_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            base_url: default_robot_base_url(),
            prefix: String::new(),
            request_id: default_robot_request_id(),
            request_timeout_secs: default_robot_timeout(),
        }
    }
}

fn default_robot_base_url() -> String {
    "http://localhost:8003".to_string()
}

fn default_robot_request_id() -> String {
    "ldui".to_string()
}

fn default_robot_timeout() -> u64 {
    30
}

/// Capture script settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Scripts run per bin, in order.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Per-script runtime bound; unbounded when absent.
    #[serde(default)]
    pub script_timeout_secs: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scripts: Vec::new(),
            step_delay_ms: default_step_delay_ms(),
            script_timeout_secs: None,
        }
    }
}

fn default_step_delay_ms() -> u64 {
    500
}

/// Vision service endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_recognition_base_url")]
    pub base_url: String,
    #[serde(default = "default_recognition_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            base_url: default_recognition_base_url(),
            request_timeout_secs: default_recognition_timeout(),
        }
    }
}

fn default_recognition_base_url() -> String {
    "http://localhost:8004".to_string()
}

fn default_recognition_timeout() -> u64 {
    60
}

/// Workflow timing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Bound on each bin's robot arrival wait.
    #[serde(default = "default_arrival_timeout")]
    pub arrival_timeout_secs: u64,
    /// Signal waiter re-check interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            arrival_timeout_secs: default_arrival_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_arrival_timeout() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
