//! Script-based capture stage implementation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use stocktake_core::stage::{CaptureStage, CaptureStepResult};

/// Default pause between capture scripts, giving the cameras settle time.
const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Capture stage that runs a fixed sequence of scripts per bin.
///
/// Each script is invoked as `<script> --task-no <id> --bin-location
/// <code>`. A missing or failing script yields a failed step result; the
/// sequence always runs to the end regardless.
pub struct ScriptCapture {
    scripts: Vec<PathBuf>,
    step_delay: Duration,
    script_timeout: Option<Duration>,
}

impl ScriptCapture {
    /// Create a capture stage over the given scripts, in order.
    pub fn new(scripts: Vec<PathBuf>) -> Self {
        Self {
            scripts,
            step_delay: DEFAULT_STEP_DELAY,
            script_timeout: None,
        }
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Bound each script's runtime; unbounded when not set.
    pub fn with_script_timeout(mut self, limit: Duration) -> Self {
        self.script_timeout = Some(limit);
        self
    }

    async fn run_script(
        &self,
        script: &Path,
        task_id: &str,
        bin_location: &str,
    ) -> CaptureStepResult {
        let script_name = script
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| script.display().to_string());

        if !script.exists() {
            // full path in the result so the operator can fix the config
            return CaptureStepResult::failed(
                script.display().to_string(),
                -1,
                format!("script not found: {}", script.display()),
            );
        }

        let mut cmd = Command::new(script);
        cmd.arg("--task-no")
            .arg(task_id)
            .arg("--bin-location")
            .arg(bin_location);

        let output = if let Some(limit) = self.script_timeout {
            match timeout(limit, cmd.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return CaptureStepResult::failed(script_name, -1, "script timed out");
                }
            }
        } else {
            cmd.output().await
        };

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                return CaptureStepResult::failed(
                    script_name,
                    -1,
                    format!("script execution failed: {e}"),
                );
            }
        };

        CaptureStepResult {
            script: script_name,
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            error: None,
        }
    }
}

#[async_trait]
impl CaptureStage for ScriptCapture {
    async fn capture(&self, task_id: &str, bin_location: &str) -> Vec<CaptureStepResult> {
        let mut results = Vec::with_capacity(self.scripts.len());
        for (index, script) in self.scripts.iter().enumerate() {
            let result = self.run_script(script, task_id, bin_location).await;
            if result.success {
                tracing::debug!(
                    script = %result.script,
                    bin_location = %bin_location,
                    "capture script finished"
                );
            } else {
                tracing::warn!(
                    script = %result.script,
                    bin_location = %bin_location,
                    exit_code = result.exit_code,
                    "capture script failed"
                );
            }
            results.push(result);
            if index + 1 < self.scripts.len() {
                tokio::time::sleep(self.step_delay).await;
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_script_captures_output() {
        let stage = ScriptCapture::new(vec![PathBuf::from("/bin/echo")])
            .with_step_delay(Duration::from_millis(1));
        let results = stage.capture("T001", "A-01").await;

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].exit_code, 0);
        assert_eq!(results[0].script, "echo");
        assert!(results[0].stdout.contains("T001"));
        assert!(results[0].stdout.contains("A-01"));
    }

    #[tokio::test]
    async fn test_missing_script_does_not_abort_sequence() {
        let stage = ScriptCapture::new(vec![
            PathBuf::from("/nonexistent/cam0.sh"),
            PathBuf::from("/bin/echo"),
        ])
        .with_step_delay(Duration::from_millis(1));
        let results = stage.capture("T001", "A-01").await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].exit_code, -1);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("/nonexistent/cam0.sh"));
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn test_failing_script_reports_exit_code() {
        let stage = ScriptCapture::new(vec![PathBuf::from("/bin/false")]);
        let results = stage.capture("T001", "A-01").await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert_eq!(results[0].exit_code, 1);
        assert!(results[0].error.is_none());
    }
}
