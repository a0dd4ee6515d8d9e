use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing migration activity.
#[derive(Default)]
pub struct MigrationMetrics {
    attempted: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    chunks_written: AtomicU64,
}

impl MigrationMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a source row entered the pipeline.
    pub fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fully written row and the number of chunks it carried.
    ///
    /// Returns the running total of written rows, used to pace progress reporting.
    pub fn record_written(&self, chunk_count: u64) -> u64 {
        self.chunks_written
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.written.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a row that was skipped because of a failure.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            chunks_written: self.chunks_written.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of migration counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Source rows that entered the pipeline.
    pub attempted: u64,
    /// Rows whose search and content documents were both written.
    pub written: u64,
    /// Rows skipped because of a source, field, or sink failure.
    pub failed: u64,
    /// Chunks carried by written content documents.
    pub chunks_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_written_rows_and_chunks() {
        let metrics = MigrationMetrics::new();
        metrics.record_attempt();
        metrics.record_attempt();
        assert_eq!(metrics.record_written(2), 1);
        assert_eq!(metrics.record_written(3), 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.attempted, 2);
        assert_eq!(snapshot.written, 2);
        assert_eq!(snapshot.chunks_written, 5);
        assert_eq!(snapshot.failed, 0);
    }

    #[test]
    fn failures_do_not_touch_written_counts() {
        let metrics = MigrationMetrics::new();
        metrics.record_attempt();
        metrics.record_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.written, 0);
        assert_eq!(snapshot.chunks_written, 0);
    }
}
