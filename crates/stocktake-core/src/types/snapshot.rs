//! Consistent task read model

use serde::{Deserialize, Serialize};

use super::{BinRecord, BinState, Task};

/// Consistent copy of a task and its ordered bin records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task: Task,
    /// Bin records in submission order
    pub bins: Vec<BinRecord>,
    /// completed bins / total steps * 100, rounded to two decimals
    pub progress_percentage: f64,
}

impl TaskSnapshot {
    pub fn new(task: Task, bins: Vec<BinRecord>) -> Self {
        let progress_percentage = progress_percentage(&bins, task.total_steps);
        Self {
            task,
            bins,
            progress_percentage,
        }
    }

    /// Number of bins in a terminal `Completed` state
    pub fn completed_count(&self) -> usize {
        self.bins
            .iter()
            .filter(|b| b.state == BinState::Completed)
            .count()
    }
}

fn progress_percentage(bins: &[BinRecord], total_steps: u32) -> f64 {
    if total_steps == 0 {
        return 0.0;
    }
    let completed = bins
        .iter()
        .filter(|b| b.state == BinState::Completed)
        .count();
    let raw = completed as f64 / total_steps as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
