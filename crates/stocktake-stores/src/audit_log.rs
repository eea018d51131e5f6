//! AuditLog in-memory implementation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::RwLock;

use stocktake_core::store::{AuditLog, OperationRecord, StoreError};

const DEFAULT_IN_MEMORY_LOG_LIMIT: usize = 10_000;

/// In-memory audit log for development and testing.
pub struct InMemoryAuditLog {
    records: RwLock<VecDeque<OperationRecord>>,
    max_records: usize,
}

impl InMemoryAuditLog {
    /// Create a new in-memory log.
    pub fn new() -> Self {
        Self::with_max_records(DEFAULT_IN_MEMORY_LOG_LIMIT)
    }

    /// Create a new in-memory log with a hard capacity limit; the oldest
    /// record is dropped once the limit is reached.
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_records: max_records.max(1),
        }
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, record: OperationRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    async fn recent(&self, limit: usize, days: i64) -> Result<Vec<OperationRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let cutoff = Utc::now() - Duration::days(days);
        let mut result: Vec<OperationRecord> = records
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        result.truncate(limit);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocktake_core::store::OperationType;

    fn record_aged(action: &str, days_ago: i64) -> OperationRecord {
        let mut record = OperationRecord::new(OperationType::Inventory, action);
        record.timestamp = Utc::now() - Duration::days(days_ago);
        record
    }

    #[test]
    fn test_recent_newest_first_and_truncated() {
        tokio_test::block_on(async {
            let log = InMemoryAuditLog::new();
            log.record(record_aged("first", 3)).await.unwrap();
            log.record(record_aged("second", 2)).await.unwrap();
            log.record(record_aged("third", 1)).await.unwrap();

            let recent = log.recent(2, 180).await.unwrap();
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].action, "third");
            assert_eq!(recent[1].action, "second");
        });
    }

    #[test]
    fn test_recent_filters_by_age() {
        tokio_test::block_on(async {
            let log = InMemoryAuditLog::new();
            log.record(record_aged("ancient", 200)).await.unwrap();
            log.record(record_aged("fresh", 1)).await.unwrap();

            let recent = log.recent(10, 180).await.unwrap();
            assert_eq!(recent.len(), 1);
            assert_eq!(recent[0].action, "fresh");
        });
    }

    #[test]
    fn test_capacity_limit_drops_oldest() {
        tokio_test::block_on(async {
            let log = InMemoryAuditLog::with_max_records(2);
            log.record(record_aged("a", 3)).await.unwrap();
            log.record(record_aged("b", 2)).await.unwrap();
            log.record(record_aged("c", 1)).await.unwrap();

            let recent = log.recent(10, 180).await.unwrap();
            assert_eq!(recent.len(), 2);
            assert!(recent.iter().all(|r| r.action != "a"));
        });
    }
}
