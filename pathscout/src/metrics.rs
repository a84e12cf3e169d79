use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters shared by all workers of one search.
///
/// Totals are exact only once every worker has joined.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    matches: AtomicU64,
    dirs_scanned: AtomicU64,
    entries_seen: AtomicU64,
    permission_denied: AtomicU64,
    worker_failures: AtomicU64,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a match and returns the running total
    pub fn record_match(&self) -> u64 {
        self.matches.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_dir(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entry(&self) {
        self.entries_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_permission_denied(&self) {
        self.permission_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_failure(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            matches: self.matches.load(Ordering::Relaxed),
            dirs_scanned: self.dirs_scanned.load(Ordering::Relaxed),
            entries_seen: self.entries_seen.load(Ordering::Relaxed),
            permission_denied: self.permission_denied.load(Ordering::Relaxed),
            worker_failures: self.worker_failures.load(Ordering::Relaxed),
        }
    }

    /// Logs current counters
    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            matches = stats.matches,
            dirs = stats.dirs_scanned,
            entries = stats.entries_seen,
            denied = stats.permission_denied,
            failed_workers = stats.worker_failures,
            "Search stats"
        );
    }
}

/// Point-in-time copy of [`SearchMetrics`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub matches: u64,
    pub dirs_scanned: u64,
    pub entries_seen: u64,
    pub permission_denied: u64,
    pub worker_failures: u64,
}
