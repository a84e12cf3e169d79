use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::gate::StartGate;
use super::matcher::NameMatcher;
use super::queue::{PathEntry, WorkQueue};
use super::worker::Worker;
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::report::{Reporter, StdoutReporter};
use crate::results::{SearchOutcome, WorkerFailure};

/// State shared by the driver and every worker for the duration of one search
pub struct SearchContext {
    pub queue: WorkQueue,
    pub gate: StartGate,
    pub matcher: NameMatcher,
    pub metrics: SearchMetrics,
    pub reporter: Arc<dyn Reporter>,
}

/// Searches the tree under `config.root_path`, printing results to stdout
pub fn search(config: &SearchConfig) -> SearchResult<SearchOutcome> {
    search_with_reporter(config, Arc::new(StdoutReporter::new()))
}

/// Searches the tree under `config.root_path`, sending results to `reporter`.
///
/// Returns `Err` only if the search could not start. Workers that fail part
/// way through are listed in [`SearchOutcome::failures`].
pub fn search_with_reporter(
    config: &SearchConfig,
    reporter: Arc<dyn Reporter>,
) -> SearchResult<SearchOutcome> {
    config.validate()?;
    check_root(&config.root_path)?;

    info!(
        root = %config.root_path.display(),
        term = %config.term,
        workers = config.thread_count.get(),
        "Starting search"
    );

    let ctx = Arc::new(SearchContext {
        queue: WorkQueue::new(PathEntry::new(&config.root_path)?),
        gate: StartGate::new(config.thread_count),
        matcher: NameMatcher::new(config.term.clone()),
        metrics: SearchMetrics::new(),
        reporter,
    });

    let workers = spawn_workers(&ctx, config.thread_count.get())?;

    ctx.gate.wait_all_registered();
    let start = Instant::now();
    ctx.gate.open();
    debug!(count = workers.len(), "Start gate opened");

    let failures = join_workers(&ctx, workers);
    let elapsed = start.elapsed();

    ctx.metrics.log_stats();
    let outcome = SearchOutcome {
        match_count: ctx.metrics.matches(),
        all_workers_succeeded: failures.is_empty(),
        failures,
        stats: ctx.metrics.snapshot(),
        queue: ctx.queue.stats(),
        elapsed,
    };

    info!(
        matches = outcome.match_count,
        success = outcome.all_workers_succeeded,
        "Search complete"
    );
    Ok(outcome)
}

/// The root must be an existing directory that can be listed
fn check_root(root: &Path) -> SearchResult<()> {
    match fs::read_dir(root) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SearchError::root_not_found(root)),
        Err(e) if root.is_file() => {
            debug!(error = %e, "Root is not a directory");
            Err(SearchError::not_a_directory(root))
        }
        Err(e) => Err(SearchError::open_dir(root, e)),
    }
}

fn spawn_workers(ctx: &Arc<SearchContext>, count: usize) -> SearchResult<Vec<Worker>> {
    let mut workers = Vec::with_capacity(count);
    for id in 0..count {
        match Worker::spawn(id, Arc::clone(ctx)) {
            Ok(worker) => workers.push(worker),
            Err(e) => {
                // Workers already parked at the gate leave without searching
                ctx.gate.abort();
                for worker in workers {
                    let _ = worker.join();
                }
                return Err(e);
            }
        }
    }
    debug!(count = workers.len(), "Workers spawned");
    Ok(workers)
}

fn join_workers(ctx: &SearchContext, workers: Vec<Worker>) -> Vec<WorkerFailure> {
    let mut failures = Vec::new();
    for worker in workers {
        let id = worker.id();
        if let Err(e) = worker.join() {
            if e.is_worker_fatal() {
                warn!(worker = id, path = ?e.path(), error = %e, "Worker failed");
            } else {
                error!(worker = id, error = %e, "Worker stopped on an unexpected error");
            }
            ctx.metrics.record_worker_failure();
            failures.push(WorkerFailure {
                worker: id,
                message: e.to_string(),
            });
        }
    }
    failures
}
