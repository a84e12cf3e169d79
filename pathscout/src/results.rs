use serde::Serialize;
use std::time::Duration;

use crate::errors::SearchResult;
use crate::metrics::MetricsSnapshot;
use crate::search::QueueStats;

/// A worker that stopped early
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerFailure {
    /// Index of the worker in the pool
    pub worker: usize,
    /// Why it stopped
    pub message: String,
}

/// The result of a completed search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Files and symlinks whose name contains the term
    pub match_count: u64,
    /// False if any worker hit a fatal error
    pub all_workers_succeeded: bool,
    /// One entry per failed worker
    pub failures: Vec<WorkerFailure>,
    /// Traversal counters
    pub stats: MetricsSnapshot,
    /// Work queue counters
    pub queue: QueueStats,
    /// Time from opening the start gate until every worker joined
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// The closing line printed after a search
    pub fn summary_line(&self) -> String {
        format!("Done searching, found {} files", self.match_count)
    }

    pub fn to_json(&self) -> SearchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
