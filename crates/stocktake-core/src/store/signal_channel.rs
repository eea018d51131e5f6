//! Robot status signal channel trait

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::RobotStatusEvent;

/// Signal channel errors
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("timed out after {waited_ms}ms waiting for robot status '{method}'")]
    Timeout { method: String, waited_ms: u64 },

    #[error("signal backend error: {0}")]
    Backend(String),
}

/// SignalChannel trait - single-slot, latest-wins robot status channel
///
/// One producer (the robot status ingress) overwrites the slot; any number
/// of waiters observe it. Intermediate signals may be lost to a slow
/// waiter, which is acceptable: waiters only care about eventually seeing
/// their method, not about every signal in between. The backend is chosen
/// at construction and never changes afterwards.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Store the event as the latest signal and wake all current waiters.
    async fn publish(&self, event: RobotStatusEvent) -> Result<(), SignalError>;

    /// Block until a signal with the expected method is observed or the
    /// timeout elapses.
    ///
    /// A matching signal already in the slot satisfies the wait
    /// immediately, even if it was published before this call.
    async fn wait_for(
        &self,
        method: &str,
        timeout: Duration,
    ) -> Result<RobotStatusEvent, SignalError>;

    /// Copy of the most recently published signal, if any.
    fn latest(&self) -> Option<RobotStatusEvent>;
}
