//! Task type definitions
//!
//! A task is one inventory run over an ordered list of bin locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for task IDs (caller-supplied, unique per run)
pub type TaskId = String;

/// Task state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created, workflow not yet running
    Init,
    /// Workflow is processing bins
    Running,
    /// Every bin completed
    Completed,
    /// Aborted on the first bin failure
    Failed,
}

impl TaskState {
    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// Check if the task is active (a duplicate start must not reset it)
    pub fn is_active(&self) -> bool {
        matches!(self, TaskState::Init | TaskState::Running)
    }

    /// Legal transition set: `Init -> Running -> {Completed, Failed}`
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (*self, next),
            (TaskState::Init, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Init => "init",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Task - one inventory run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Caller-supplied identifier, unique per run
    pub id: TaskId,
    /// Current state of the task
    pub state: TaskState,
    /// 1-based sequence of the bin being processed (0 before the first)
    pub current_step: u32,
    /// Bin count at creation; never changes for the task's lifetime
    pub total_steps: u32,
    /// When the run was created
    pub started_at: Option<DateTime<Utc>>,
    /// Set once the task reaches a terminal state
    pub ended_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in `Init` state
    pub fn new(id: impl Into<TaskId>, total_steps: u32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: TaskState::Init,
            current_step: 0,
            total_steps,
            started_at: Some(now),
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the task state; terminal states also stamp `ended_at`
    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
        let now = Utc::now();
        if state.is_terminal() {
            self.ended_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Update the current step
    pub fn set_current_step(&mut self, step: u32) {
        self.current_step = step;
        self.updated_at = Utc::now();
    }
}
