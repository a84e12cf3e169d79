//! Worker thread logic for the parallel tree search
//!
//! Each worker:
//! - Registers at the start gate and waits for the whole pool
//! - Pulls directories from the shared work queue
//! - Lists each directory, matching files and symlinks by name
//! - Pushes readable sub-directories back onto the queue
//!
//! A permission error on a directory is reported and skipped. Any other
//! failure while opening, listing, or stat-ing ends this worker only.

use std::fs::{self, FileType, Metadata};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

use super::engine::SearchContext;
use super::gate::Release;
use super::queue::PathEntry;
use crate::errors::{SearchError, SearchResult};

/// What a directory entry is, without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
    Dir,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_file() {
            EntryKind::File
        } else if ft.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Other
        }
    }
}

/// A worker thread of the search pool
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<SearchResult<()>>>,
}

impl Worker {
    /// Spawns a worker thread. It parks at the start gate until released.
    pub fn spawn(id: usize, ctx: Arc<SearchContext>) -> SearchResult<Self> {
        let handle = thread::Builder::new()
            .name(format!("pathscout-{}", id))
            .spawn(move || worker_loop(id, &ctx))
            .map_err(|e| SearchError::spawn_failed(id, e))?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Waits for the worker to finish and returns how it ended
    pub fn join(mut self) -> SearchResult<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(SearchError::WorkerPanicked(self.id))),
            None => Ok(()),
        }
    }
}

fn worker_loop(id: usize, ctx: &SearchContext) -> SearchResult<()> {
    if ctx.gate.arrive_and_wait() == Release::Abort {
        debug!(worker = id, "Start aborted");
        return Ok(());
    }
    debug!(worker = id, "Worker starting");

    while let Some(task) = ctx.queue.dequeue() {
        // `task` is dropped on every exit from this body, including `?`
        scan_directory(id, ctx, task.path())?;
    }

    debug!(worker = id, "Worker finished");
    Ok(())
}

/// Lists one directory. Errors returned from here are fatal for the worker.
fn scan_directory(id: usize, ctx: &SearchContext, dir: &PathEntry) -> SearchResult<()> {
    let entries = match fs::read_dir(dir.as_path()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            report_denied(ctx, dir.as_path());
            return Ok(());
        }
        Err(e) => {
            warn!(worker = id, path = %dir, error = %e, "Failed to open directory");
            return Err(SearchError::open_dir(dir.as_path(), e));
        }
    };
    ctx.metrics.record_dir();
    trace!(worker = id, path = %dir, "Scanning directory");

    // `read_dir` never yields the `.` and `..` entries
    for entry in entries {
        let entry = entry.map_err(|e| {
            warn!(worker = id, path = %dir, error = %e, "Failed to read directory");
            SearchError::read_dir(dir.as_path(), e)
        })?;

        let name = entry.file_name();
        ctx.metrics.record_entry();

        let path = dir.child(&name);
        let metadata = fs::symlink_metadata(&path).map_err(|e| {
            warn!(worker = id, path = %path.display(), error = %e, "Failed to stat entry");
            SearchError::metadata(&path, e)
        })?;

        match EntryKind::from(metadata.file_type()) {
            EntryKind::File | EntryKind::Symlink => {
                if ctx.matcher.is_match(&name) {
                    ctx.metrics.record_match();
                    ctx.reporter.on_match(&path);
                }
            }
            EntryKind::Dir => {
                if is_readable(&metadata) {
                    ctx.queue.enqueue(PathEntry::new(path)?);
                } else {
                    report_denied(ctx, &path);
                }
            }
            EntryKind::Other => {
                trace!(worker = id, path = %path.display(), "Skipping special file");
            }
        }
    }

    Ok(())
}

fn report_denied(ctx: &SearchContext, path: &std::path::Path) {
    debug!(path = %path.display(), "Permission denied");
    ctx.metrics.record_permission_denied();
    ctx.reporter.on_permission_denied(path);
}

/// Owner read bit, as the sub-directory check
#[cfg(unix)]
fn is_readable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o400 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &Metadata) -> bool {
    true
}
