//! In-process signal channel implementation.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use stocktake_core::store::{SignalChannel, SignalError};
use stocktake_core::types::RobotStatusEvent;

/// Default re-check interval for waiters.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Single-slot, latest-wins channel for robot status signals.
///
/// Publishing overwrites the slot and wakes all waiters. Waiters re-check
/// the slot on wake and additionally on a fixed poll interval; the interval
/// bounds how long a waiter can miss a wakeup that raced with its own slot
/// check. Each wait slice is clamped to the remaining timeout, so the
/// requested timeout is honored even when it is shorter than the interval.
pub struct InProcessSignalChannel {
    slot: RwLock<Option<RobotStatusEvent>>,
    notify: Notify,
    poll_interval: Duration,
}

impl InProcessSignalChannel {
    /// Create a channel with the default poll interval.
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a channel with an explicit waiter re-check interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            notify: Notify::new(),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    fn matching(&self, method: &str) -> Result<Option<RobotStatusEvent>, SignalError> {
        let slot = self
            .slot
            .read()
            .map_err(|e| SignalError::Backend(e.to_string()))?;
        Ok(slot.as_ref().filter(|event| event.method == method).cloned())
    }
}

impl Default for InProcessSignalChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalChannel for InProcessSignalChannel {
    async fn publish(&self, event: RobotStatusEvent) -> Result<(), SignalError> {
        {
            let mut slot = self
                .slot
                .write()
                .map_err(|e| SignalError::Backend(e.to_string()))?;
            *slot = Some(event);
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn wait_for(
        &self,
        method: &str,
        timeout: Duration,
    ) -> Result<RobotStatusEvent, SignalError> {
        let deadline = Instant::now() + timeout;

        // A matching signal already in the slot satisfies the wait at once,
        // even if it was published before this call.
        if let Some(event) = self.matching(method)? {
            return Ok(event);
        }

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(SignalError::Timeout {
                    method: method.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            let slice = self.poll_interval.min(deadline - now);
            let _ = tokio::time::timeout(slice, self.notify.notified()).await;
            if let Some(event) = self.matching(method)? {
                return Ok(event);
            }
        }
    }

    fn latest(&self) -> Option<RobotStatusEvent> {
        self.slot.read().ok().and_then(|slot| slot.clone())
    }
}
