//! Ledger operation counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording ledger operations
#[derive(Debug, Default)]
pub struct LedgerMetrics {
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    entries_created: AtomicU64,
    entries_updated: AtomicU64,
    entries_deleted: AtomicU64,
    mutation_failures: AtomicU64,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_succeeded(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetches", "Metric incremented");
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetch_failures", "Metric incremented");
    }

    pub fn entry_created(&self) {
        self.entries_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "entries_created", "Metric incremented");
    }

    pub fn entry_updated(&self) {
        self.entries_updated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "entries_updated", "Metric incremented");
    }

    pub fn entry_deleted(&self) {
        self.entries_deleted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "entries_deleted", "Metric incremented");
    }

    pub fn mutation_failed(&self) {
        self.mutation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "mutation_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            entries_created: self.entries_created.load(Ordering::Relaxed),
            entries_updated: self.entries_updated.load(Ordering::Relaxed),
            entries_deleted: self.entries_deleted.load(Ordering::Relaxed),
            mutation_failures: self.mutation_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub fetches: u64,
    pub fetch_failures: u64,
    pub entries_created: u64,
    pub entries_updated: u64,
    pub entries_deleted: u64,
    pub mutation_failures: u64,
}
