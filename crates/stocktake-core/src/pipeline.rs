//! Per-bin processing pipeline
//!
//! Carries one bin from `Running` to `Completed` or `Failed`: wait for the
//! robot to arrive, capture, recognize, persist results, then ask the robot
//! to continue. Every failure is contained here and returned as a value;
//! the workflow executor decides what it means for the task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use crate::command::RobotCommander;
use crate::stage::{CaptureStage, CaptureStepResult, RecognitionStage};
use crate::store::{InventoryStore, SignalChannel, SignalError, StoreError};
use crate::types::{BinPatch, BinState};

/// Default bound on the robot arrival wait
pub const DEFAULT_ARRIVAL_TIMEOUT: Duration = Duration::from_secs(300);

/// Pipeline errors; each one aborts the current bin and, upstream, the task
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("robot arrival wait timed out after {waited_ms}ms for bin '{bin_location}'")]
    RobotTimeout { bin_location: String, waited_ms: u64 },

    #[error("recognition failed for bin '{bin_location}': {reason}")]
    Recognition { bin_location: String, reason: String },

    #[error("signal channel error: {0}")]
    Signal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything one bin run produced besides the stored record
#[derive(Debug, Clone)]
pub struct BinOutcome {
    pub bin_location: String,
    pub sequence: u32,
    pub capture_results: Vec<CaptureStepResult>,
    /// Whether a continue command was issued (false for the last bin)
    pub continue_attempted: bool,
    /// Continue failure, if one happened; not fatal to the bin
    pub continue_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Per-bin pipeline over the collaborator seams
#[derive(Clone)]
pub struct BinPipeline {
    store: Arc<dyn InventoryStore>,
    signals: Arc<dyn SignalChannel>,
    capture: Arc<dyn CaptureStage>,
    recognition: Arc<dyn RecognitionStage>,
    commander: Arc<dyn RobotCommander>,
    arrival_timeout: Duration,
}

impl BinPipeline {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        signals: Arc<dyn SignalChannel>,
        capture: Arc<dyn CaptureStage>,
        recognition: Arc<dyn RecognitionStage>,
        commander: Arc<dyn RobotCommander>,
    ) -> Self {
        Self {
            store,
            signals,
            capture,
            recognition,
            commander,
            arrival_timeout: DEFAULT_ARRIVAL_TIMEOUT,
        }
    }

    pub fn with_arrival_timeout(mut self, timeout: Duration) -> Self {
        self.arrival_timeout = timeout;
        self
    }

    /// Process one bin. The caller has already marked it `Running`; this
    /// marks the terminal bin state before returning.
    pub async fn process(
        &self,
        task_id: &str,
        bin_location: &str,
        sequence: u32,
        total: u32,
    ) -> Result<BinOutcome, PipelineError> {
        let started_at = Utc::now();
        match self
            .run_stages(task_id, bin_location, sequence, total, started_at)
            .await
        {
            Ok(outcome) => {
                self.store
                    .update_bin(
                        task_id,
                        sequence,
                        BinPatch::new()
                            .with_state(BinState::Completed)
                            .with_ended_at(outcome.ended_at),
                    )
                    .await?;
                tracing::info!(
                    task_id = %task_id,
                    bin_location = %bin_location,
                    sequence = sequence,
                    "bin processing completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                if let Err(store_err) = self
                    .store
                    .update_bin(
                        task_id,
                        sequence,
                        BinPatch::new()
                            .with_state(BinState::Failed)
                            .with_ended_at(Utc::now()),
                    )
                    .await
                {
                    tracing::error!(
                        task_id = %task_id,
                        sequence = sequence,
                        error = %store_err,
                        "failed to record bin failure"
                    );
                }
                tracing::error!(
                    task_id = %task_id,
                    bin_location = %bin_location,
                    sequence = sequence,
                    error = %err,
                    "bin processing failed"
                );
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        task_id: &str,
        bin_location: &str,
        sequence: u32,
        total: u32,
        started_at: DateTime<Utc>,
    ) -> Result<BinOutcome, PipelineError> {
        tracing::info!(
            task_id = %task_id,
            bin_location = %bin_location,
            "waiting for robot arrival"
        );
        let arrival = self
            .signals
            .wait_for("end", self.arrival_timeout)
            .await
            .map_err(|err| match err {
                SignalError::Timeout { waited_ms, .. } => PipelineError::RobotTimeout {
                    bin_location: bin_location.to_string(),
                    waited_ms,
                },
                SignalError::Backend(reason) => PipelineError::Signal(reason),
            })?;
        tracing::debug!(
            task_id = %task_id,
            method = %arrival.method,
            "robot arrival signal observed"
        );

        let capture_results = self.capture.capture(task_id, bin_location).await;
        let failed_steps = capture_results.iter().filter(|r| !r.success).count();
        if failed_steps > 0 {
            tracing::warn!(
                task_id = %task_id,
                bin_location = %bin_location,
                failed_steps = failed_steps,
                total_steps = capture_results.len(),
                "capture finished with sub-step failures"
            );
        } else {
            tracing::info!(
                task_id = %task_id,
                bin_location = %bin_location,
                steps = capture_results.len(),
                "capture finished"
            );
        }

        let recognition = self
            .recognition
            .recognize(task_id, bin_location)
            .await
            .map_err(|err| PipelineError::Recognition {
                bin_location: bin_location.to_string(),
                reason: err.to_string(),
            })?;

        let mut patch = BinPatch::new()
            .with_image_data(recognition.image_data.clone())
            .with_compute_result(recognition.compute_result.clone());
        if let Some(t) = recognition.capture_time {
            patch = patch.with_capture_time(t);
        }
        if let Some(t) = recognition.compute_time {
            patch = patch.with_compute_time(t);
        }
        let matched = self
            .store
            .update_bin_by_location(task_id, bin_location, patch)
            .await?;
        if !matched {
            tracing::warn!(
                task_id = %task_id,
                bin_location = %bin_location,
                "no bin record matched location for recognition results"
            );
        }
        self.store
            .set_bin_detail(
                task_id,
                bin_location,
                json!({
                    "image_data": recognition.image_data,
                    "compute_result": recognition.compute_result,
                    "capture_time": recognition.capture_time,
                    "compute_time": recognition.compute_time,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;

        let (continue_attempted, continue_error) = if sequence < total {
            match self.commander.continue_task().await {
                Ok(_) => {
                    tracing::info!(
                        task_id = %task_id,
                        sequence = sequence,
                        "continue command accepted"
                    );
                    (true, None)
                }
                Err(err) => {
                    tracing::warn!(
                        task_id = %task_id,
                        sequence = sequence,
                        error = %err,
                        "continue command failed"
                    );
                    (true, Some(err.to_string()))
                }
            }
        } else {
            (false, None)
        };

        Ok(BinOutcome {
            bin_location: bin_location.to_string(),
            sequence,
            capture_results,
            continue_attempted,
            continue_error,
            started_at,
            ended_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandAck, CommandError};
    use crate::stage::{RecognitionError, RecognitionOutcome};
    use crate::store::InventoryStore;
    use crate::types::{BinRecord, RobotStatusEvent, Task, TaskSnapshot, TaskState};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemStore {
        tasks: Mutex<HashMap<String, (Task, Vec<BinRecord>, HashMap<String, Value>)>>,
    }

    impl MemStore {
        fn seeded(task_id: &str, locations: &[&str]) -> Self {
            let bins = locations
                .iter()
                .enumerate()
                .map(|(i, loc)| BinRecord::new(*loc, i as u32 + 1))
                .collect::<Vec<_>>();
            let task = Task::new(task_id, bins.len() as u32);
            let mut tasks = HashMap::new();
            tasks.insert(task_id.to_string(), (task, bins, HashMap::new()));
            Self {
                tasks: Mutex::new(tasks),
            }
        }

        fn bin(&self, task_id: &str, sequence: u32) -> BinRecord {
            let tasks = self.tasks.lock().unwrap();
            tasks[task_id]
                .1
                .iter()
                .find(|b| b.sequence == sequence)
                .cloned()
                .unwrap()
        }

        fn detail(&self, task_id: &str, location: &str) -> Option<Value> {
            let tasks = self.tasks.lock().unwrap();
            tasks[task_id].2.get(location).cloned()
        }
    }

    #[async_trait]
    impl InventoryStore for MemStore {
        async fn create_task(
            &self,
            task_id: &str,
            bin_locations: &[String],
        ) -> Result<Task, StoreError> {
            let task = Task::new(task_id, bin_locations.len() as u32);
            let bins = bin_locations
                .iter()
                .enumerate()
                .map(|(i, loc)| BinRecord::new(loc.clone(), i as u32 + 1))
                .collect();
            self.tasks
                .lock()
                .unwrap()
                .insert(task_id.to_string(), (task.clone(), bins, HashMap::new()));
            Ok(task)
        }

        async fn transition_task(&self, task_id: &str, to: TaskState) -> Result<(), StoreError> {
            let mut tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            entry.0.set_state(to);
            Ok(())
        }

        async fn set_current_step(&self, task_id: &str, step: u32) -> Result<(), StoreError> {
            let mut tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            entry.0.set_current_step(step);
            Ok(())
        }

        async fn update_bin(
            &self,
            task_id: &str,
            sequence: u32,
            patch: BinPatch,
        ) -> Result<(), StoreError> {
            let mut tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            let bin = entry
                .1
                .iter_mut()
                .find(|b| b.sequence == sequence)
                .ok_or_else(|| StoreError::BinNotFound {
                    task_id: task_id.to_string(),
                    sequence,
                })?;
            bin.apply(patch);
            Ok(())
        }

        async fn update_bin_by_location(
            &self,
            task_id: &str,
            bin_location: &str,
            patch: BinPatch,
        ) -> Result<bool, StoreError> {
            let mut tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            match entry.1.iter_mut().find(|b| b.bin_location == bin_location) {
                Some(bin) => {
                    bin.apply(patch);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn snapshot(&self, task_id: &str) -> Result<TaskSnapshot, StoreError> {
            let tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            Ok(TaskSnapshot::new(entry.0.clone(), entry.1.clone()))
        }

        async fn set_bin_detail(
            &self,
            task_id: &str,
            bin_location: &str,
            detail: Value,
        ) -> Result<(), StoreError> {
            let mut tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get_mut(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            entry.2.insert(bin_location.to_string(), detail);
            Ok(())
        }

        async fn bin_detail(
            &self,
            task_id: &str,
            bin_location: &str,
        ) -> Result<Option<Value>, StoreError> {
            let tasks = self.tasks.lock().unwrap();
            let entry = tasks
                .get(task_id)
                .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
            Ok(entry.2.get(bin_location).cloned())
        }
    }

    struct RecordingSignals {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SignalChannel for RecordingSignals {
        async fn publish(&self, event: RobotStatusEvent) -> Result<(), SignalError> {
            self.log.lock().unwrap().push(format!("publish:{}", event.method));
            Ok(())
        }

        async fn wait_for(
            &self,
            method: &str,
            _timeout: Duration,
        ) -> Result<RobotStatusEvent, SignalError> {
            self.log.lock().unwrap().push(format!("wait:{method}"));
            Ok(RobotStatusEvent::new(method, Value::Null))
        }

        fn latest(&self) -> Option<RobotStatusEvent> {
            None
        }
    }

    struct NeverSignals;

    #[async_trait]
    impl SignalChannel for NeverSignals {
        async fn publish(&self, _event: RobotStatusEvent) -> Result<(), SignalError> {
            Ok(())
        }

        async fn wait_for(
            &self,
            method: &str,
            timeout: Duration,
        ) -> Result<RobotStatusEvent, SignalError> {
            Err(SignalError::Timeout {
                method: method.to_string(),
                waited_ms: timeout.as_millis() as u64,
            })
        }

        fn latest(&self) -> Option<RobotStatusEvent> {
            None
        }
    }

    struct StaticCapture {
        results: Vec<CaptureStepResult>,
    }

    #[async_trait]
    impl CaptureStage for StaticCapture {
        async fn capture(&self, _task_id: &str, _bin_location: &str) -> Vec<CaptureStepResult> {
            self.results.clone()
        }
    }

    struct StaticRecognition {
        fail: bool,
    }

    #[async_trait]
    impl RecognitionStage for StaticRecognition {
        async fn recognize(
            &self,
            _task_id: &str,
            _bin_location: &str,
        ) -> Result<RecognitionOutcome, RecognitionError> {
            if self.fail {
                return Err(RecognitionError::Service("no result".to_string()));
            }
            Ok(RecognitionOutcome {
                image_data: serde_json::json!({"path": "/tmp/cam0.png"}),
                compute_result: serde_json::json!({"count": 12}),
                capture_time: Some(Utc::now()),
                compute_time: Some(Utc::now()),
            })
        }
    }

    struct RecordingCommander {
        log: Arc<Mutex<Vec<String>>>,
        fail_continue: bool,
    }

    #[async_trait]
    impl RobotCommander for RecordingCommander {
        async fn submit_task(
            &self,
            _task_id: &str,
            _bin_locations: &[String],
        ) -> Result<CommandAck, CommandError> {
            self.log.lock().unwrap().push("submit".to_string());
            Ok(CommandAck::default())
        }

        async fn continue_task(&self) -> Result<CommandAck, CommandError> {
            self.log.lock().unwrap().push("continue".to_string());
            if self.fail_continue {
                return Err(CommandError::Rejected("code FAIL".to_string()));
            }
            Ok(CommandAck::default())
        }
    }

    struct Fixture {
        store: Arc<MemStore>,
        log: Arc<Mutex<Vec<String>>>,
        pipeline: BinPipeline,
    }

    fn fixture(locations: &[&str], recognition_fails: bool, continue_fails: bool) -> Fixture {
        let store = Arc::new(MemStore::seeded("T001", locations));
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = BinPipeline::new(
            store.clone(),
            Arc::new(RecordingSignals { log: log.clone() }),
            Arc::new(StaticCapture {
                results: vec![CaptureStepResult::ok("cam0.sh", "captured")],
            }),
            Arc::new(StaticRecognition {
                fail: recognition_fails,
            }),
            Arc::new(RecordingCommander {
                log: log.clone(),
                fail_continue: continue_fails,
            }),
        );
        Fixture {
            store,
            log,
            pipeline,
        }
    }

    #[test]
    fn test_bin_completes_and_stores_results() {
        tokio_test::block_on(async {
            let fx = fixture(&["A-01", "A-02"], false, false);
            let outcome = fx.pipeline.process("T001", "A-01", 1, 2).await.unwrap();

            assert!(outcome.continue_attempted);
            assert!(outcome.continue_error.is_none());

            let bin = fx.store.bin("T001", 1);
            assert_eq!(bin.state, BinState::Completed);
            assert!(bin.ended_at.is_some());
            assert_eq!(bin.image_data, Some(serde_json::json!({"path": "/tmp/cam0.png"})));
            assert_eq!(bin.compute_result, Some(serde_json::json!({"count": 12})));

            let detail = fx.store.detail("T001", "A-01").unwrap();
            assert_eq!(detail["compute_result"], serde_json::json!({"count": 12}));
            assert!(detail.get("updated_at").is_some());
        });
    }

    #[test]
    fn test_continue_runs_after_arrival_wait() {
        tokio_test::block_on(async {
            let fx = fixture(&["A-01", "A-02"], false, false);
            fx.pipeline.process("T001", "A-01", 1, 2).await.unwrap();

            let log = fx.log.lock().unwrap();
            let wait_pos = log.iter().position(|e| e == "wait:end").unwrap();
            let continue_pos = log.iter().position(|e| e == "continue").unwrap();
            assert!(wait_pos < continue_pos);
        });
    }

    #[test]
    fn test_last_bin_skips_continue() {
        tokio_test::block_on(async {
            let fx = fixture(&["A-01", "A-02"], false, false);
            let outcome = fx.pipeline.process("T001", "A-02", 2, 2).await.unwrap();

            assert!(!outcome.continue_attempted);
            assert!(!fx.log.lock().unwrap().iter().any(|e| e == "continue"));
        });
    }

    #[test]
    fn test_capture_sub_failures_do_not_abort() {
        tokio_test::block_on(async {
            let store = Arc::new(MemStore::seeded("T001", &["A-01"]));
            let log = Arc::new(Mutex::new(Vec::new()));
            let pipeline = BinPipeline::new(
                store.clone(),
                Arc::new(RecordingSignals { log: log.clone() }),
                Arc::new(StaticCapture {
                    results: vec![
                        CaptureStepResult::ok("cam0.sh", "captured"),
                        CaptureStepResult::failed("cam1.sh", 2, "device busy"),
                    ],
                }),
                Arc::new(StaticRecognition { fail: false }),
                Arc::new(RecordingCommander {
                    log,
                    fail_continue: false,
                }),
            );

            let outcome = pipeline.process("T001", "A-01", 1, 1).await.unwrap();
            assert_eq!(outcome.capture_results.len(), 2);
            assert!(!outcome.capture_results[1].success);
            assert_eq!(store.bin("T001", 1).state, BinState::Completed);
        });
    }

    #[test]
    fn test_recognition_failure_fails_bin() {
        tokio_test::block_on(async {
            let fx = fixture(&["A-01", "A-02"], true, false);
            let err = fx.pipeline.process("T001", "A-01", 1, 2).await.unwrap_err();

            assert!(matches!(err, PipelineError::Recognition { .. }));
            let bin = fx.store.bin("T001", 1);
            assert_eq!(bin.state, BinState::Failed);
            assert!(bin.ended_at.is_some());
            // never reached the continue command
            assert!(!fx.log.lock().unwrap().iter().any(|e| e == "continue"));
        });
    }

    #[test]
    fn test_arrival_timeout_fails_bin() {
        tokio_test::block_on(async {
            let store = Arc::new(MemStore::seeded("T001", &["A-01"]));
            let log = Arc::new(Mutex::new(Vec::new()));
            let pipeline = BinPipeline::new(
                store.clone(),
                Arc::new(NeverSignals),
                Arc::new(StaticCapture { results: vec![] }),
                Arc::new(StaticRecognition { fail: false }),
                Arc::new(RecordingCommander {
                    log,
                    fail_continue: false,
                }),
            )
            .with_arrival_timeout(Duration::from_millis(50));

            let err = pipeline.process("T001", "A-01", 1, 1).await.unwrap_err();
            assert!(matches!(
                err,
                PipelineError::RobotTimeout { waited_ms: 50, .. }
            ));
            assert_eq!(store.bin("T001", 1).state, BinState::Failed);
        });
    }

    #[test]
    fn test_continue_rejection_is_non_fatal() {
        tokio_test::block_on(async {
            let fx = fixture(&["A-01", "A-02"], false, true);
            let outcome = fx.pipeline.process("T001", "A-01", 1, 2).await.unwrap();

            assert!(outcome.continue_attempted);
            assert!(outcome.continue_error.as_deref().unwrap().contains("FAIL"));
            assert_eq!(fx.store.bin("T001", 1).state, BinState::Completed);
        });
    }
}
