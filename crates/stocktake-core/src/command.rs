//! Robot command client seam

use async_trait::async_trait;
use thiserror::Error;

/// Positive acknowledgment from the robot control system
#[derive(Debug, Clone, Default)]
pub struct CommandAck {
    /// Message text returned by the control system, if any
    pub message: Option<String>,
}

/// Robot command errors
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// RobotCommander trait - submit and continue commands
///
/// Both operations are plain request/response with no local state. Current
/// workflow policy treats failures of either as non-fatal; callers decide
/// what a failure means for them.
#[async_trait]
pub trait RobotCommander: Send + Sync {
    /// Ask the robot system to run a route over the given bin locations,
    /// in order.
    async fn submit_task(
        &self,
        task_id: &str,
        bin_locations: &[String],
    ) -> Result<CommandAck, CommandError>;

    /// Ask the robot to proceed to the next bin. The command carries no
    /// task or bin argument; it means "proceed" for whatever route the
    /// robot is currently on.
    async fn continue_task(&self) -> Result<CommandAck, CommandError>;
}
