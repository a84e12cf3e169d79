use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Receives the lines a search produces as it goes.
///
/// Workers call these concurrently, so implementations must emit each line
/// as a unit.
pub trait Reporter: Send + Sync {
    /// A file or symbolic link whose name contains the term
    fn on_match(&self, path: &Path);

    /// A directory that was skipped because it cannot be read
    fn on_permission_denied(&self, path: &Path);
}

/// Text printed for a directory that could not be read
pub fn permission_denied_line(path: &Path) -> String {
    format!("Directory {}: Permission denied.", path.display())
}

/// Prints matches and skipped directories to stdout, one line each
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl StdoutReporter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) {
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            debug!("Failed to write to stdout: {}", e);
        }
    }
}

impl Reporter for StdoutReporter {
    fn on_match(&self, path: &Path) {
        self.emit(format_args!("{}", path.display()));
    }

    fn on_permission_denied(&self, path: &Path) {
        self.emit(format_args!("{}", permission_denied_line(path)));
    }
}

/// Keeps every reported path in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    matches: Mutex<Vec<PathBuf>>,
    denied: Mutex<Vec<PathBuf>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matched paths, sorted
    pub fn matches(&self) -> Vec<PathBuf> {
        let mut paths = self
            .matches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        paths.sort();
        paths
    }

    /// Skipped directories, sorted
    pub fn denied(&self) -> Vec<PathBuf> {
        let mut paths = self
            .denied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        paths.sort();
        paths
    }
}

impl Reporter for CollectingReporter {
    fn on_match(&self, path: &Path) {
        self.matches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
    }

    fn on_permission_denied(&self, path: &Path) {
        self.denied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
    }
}
