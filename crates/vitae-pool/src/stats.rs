//! Aggregate pool counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lock-free counters updated by workers and the submit path.
///
/// Increments are atomic; snapshots are best-effort and may tear across
/// fields under load, which is acceptable for diagnostics.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    pub jobs_queued: AtomicU64,
    pub jobs_processed: AtomicU64,
    pub jobs_successful: AtomicU64,
    pub jobs_failed: AtomicU64,
    pub total_processing_ms: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_queued(&self) {
        self.jobs_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, success: bool, duration: Duration) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
        if success {
            self.jobs_successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_processing_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStatsSnapshot {
        let processed = self.jobs_processed.load(Ordering::Relaxed);
        let total_ms = self.total_processing_ms.load(Ordering::Relaxed);

        PoolStatsSnapshot {
            jobs_queued: self.jobs_queued.load(Ordering::Relaxed),
            jobs_processed: processed,
            jobs_successful: self.jobs_successful.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            total_processing_ms: total_ms,
            average_processing_ms: if processed > 0 { total_ms / processed } else { 0 },
        }
    }
}

/// Point-in-time view of the pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatsSnapshot {
    pub jobs_queued: u64,
    pub jobs_processed: u64,
    pub jobs_successful: u64,
    pub jobs_failed: u64,
    pub total_processing_ms: u64,
    pub average_processing_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_derives_from_totals() {
        let stats = PoolStats::default();
        stats.record_queued();
        stats.record_outcome(true, Duration::from_millis(100));
        stats.record_outcome(false, Duration::from_millis(300));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.jobs_queued, 1);
        assert_eq!(snapshot.jobs_processed, 2);
        assert_eq!(snapshot.jobs_successful, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.total_processing_ms, 400);
        assert_eq!(snapshot.average_processing_ms, 200);
    }

    #[test]
    fn average_is_zero_before_any_outcome() {
        assert_eq!(PoolStats::default().snapshot().average_processing_ms, 0);
    }
}
