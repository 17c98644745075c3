use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_inserted: AtomicU64,
    failed_invocations: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ingested document and the number of rows inserted for it.
    pub fn record_document(&self, inserted: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_inserted.fetch_add(inserted, Ordering::Relaxed);
    }

    /// Record an event invocation that ended in an error response.
    pub fn record_failure(&self) {
        self.failed_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_inserted: self.chunks_inserted.load(Ordering::Relaxed),
            failed_invocations: self.failed_invocations.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents ingested since startup.
    pub documents_ingested: u64,
    /// Rows inserted across all ingested documents.
    pub chunks_inserted: u64,
    /// Event invocations that returned an error status.
    pub failed_invocations: u64,
}
