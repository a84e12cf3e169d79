//! Error types for pathscout.
//!
//! Errors fall into three groups, and callers treat them differently:
//!
//! 1. **Process-level**: a bad root, a bad configuration, or a worker that
//!    could not be spawned. The search never starts (or is torn down before
//!    any directory is read) and `search()` returns `Err`.
//!
//! 2. **Per-directory, recoverable**: permission denied on a directory. These
//!    never become a `SearchError` at all; they are reported through the
//!    [`Reporter`](crate::report::Reporter) and traversal continues.
//!
//! 3. **Per-worker fatal**: a failure to open, enumerate, or stat inside a
//!    directory. The worker that hit it stops and returns the error from its
//!    thread; the other workers keep going and the driver folds the failure
//!    into [`SearchOutcome`](crate::results::SearchOutcome).
//!
//! ```rust,ignore
//! match pathscout::search(&config) {
//!     Ok(outcome) if outcome.all_workers_succeeded => // clean run,
//!     Ok(outcome) => // some workers failed, `outcome.failures` says why,
//!     Err(SearchError::RootNotFound(path)) => // nothing was searched,
//!     Err(e) => // other setup failure
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while setting up or running a search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to open directory {path}: {source}")]
    OpenDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to stat {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Failed to spawn worker {id}: {source}")]
    SpawnFailed {
        id: usize,
        #[source]
        source: io::Error,
    },
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl SearchError {
    pub fn root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RootNotFound(path.into())
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn open_dir(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::OpenDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn read_dir(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn metadata(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Metadata {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn spawn_failed(id: usize, source: io::Error) -> Self {
        Self::SpawnFailed { id, source }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this error ends a single worker rather than the whole search.
    pub fn is_worker_fatal(&self) -> bool {
        matches!(
            self,
            Self::OpenDir { .. }
                | Self::ReadDir { .. }
                | Self::Metadata { .. }
                | Self::WorkerPanicked(_)
        )
    }

    /// The filesystem path this error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::RootNotFound(p) | Self::NotADirectory(p) => Some(p.as_path()),
            Self::OpenDir { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Metadata { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}
