//! Shared FIFO of directories still to be scanned.
//!
//! The queue is a monitor: one mutex guards the pending entries together with
//! the [`QuiescenceDetector`], and two condition variables park workers.
//! Workers that find the queue empty wait on `not_empty`; workers holding back
//! for the idle cohort wait on `cohort_served`.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{self, Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::trace;

use super::coordinator::QuiescenceDetector;
use crate::errors::{SearchError, SearchResult};

/// A directory waiting to be scanned.
///
/// Always stored with a trailing separator so child names can be appended
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry(OsString);

impl PathEntry {
    pub fn new(path: impl Into<PathBuf>) -> SearchResult<Self> {
        let mut raw = path.into().into_os_string();
        if raw.is_empty() {
            return Err(SearchError::invalid_path("directory path is empty"));
        }
        if !ends_with_separator(&raw) {
            raw.push(path::MAIN_SEPARATOR_STR);
        }
        Ok(Self(raw))
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Full path of the child `name` inside this directory
    pub fn child(&self, name: &OsStr) -> PathBuf {
        let mut raw = OsString::with_capacity(self.0.len() + name.len());
        raw.push(&self.0);
        raw.push(name);
        PathBuf::from(raw)
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}

fn ends_with_separator(raw: &OsStr) -> bool {
    raw.as_encoded_bytes()
        .last()
        .is_some_and(|&b| path::is_separator(char::from(b)))
}

/// Counters maintained under the queue lock
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Entries ever enqueued, including the root
    pub enqueued: u64,

    /// Entries ever dequeued
    pub dequeued: u64,

    /// Largest number of entries pending at once
    pub peak_len: usize,
}

struct QueueState {
    entries: VecDeque<PathEntry>,
    detector: QuiescenceDetector,
    stats: QueueStats,
}

impl QueueState {
    fn push(&mut self, entry: PathEntry) {
        self.entries.push_back(entry);
        self.stats.enqueued += 1;
        self.stats.peak_len = self.stats.peak_len.max(self.entries.len());
    }
}

/// Work queue shared by every worker of one search
pub struct WorkQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    cohort_served: Condvar,
}

impl WorkQueue {
    /// Creates a queue holding only the root directory
    pub fn new(root: PathEntry) -> Self {
        let mut state = QueueState {
            entries: VecDeque::new(),
            detector: QuiescenceDetector::new(),
            stats: QueueStats::default(),
        };
        state.push(root);

        Self {
            state: Mutex::new(state),
            not_empty: Condvar::new(),
            cohort_served: Condvar::new(),
        }
    }

    // Nothing panics while holding the lock, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        &self,
        cv: &Condvar,
        guard: MutexGuard<'a, QueueState>,
    ) -> MutexGuard<'a, QueueState> {
        cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a directory and wakes workers parked on the empty queue
    pub fn enqueue(&self, entry: PathEntry) {
        {
            let mut state = self.lock();
            trace!(path = %entry, "enqueue");
            state.push(entry);
        }
        self.not_empty.notify_all();
    }

    /// Takes the oldest pending directory, blocking while the queue is empty.
    ///
    /// Returns `None` once the search is over: the queue is empty and no
    /// worker is processing a directory. The returned [`ActiveTask`] counts
    /// as active until it is dropped.
    pub fn dequeue(&self) -> Option<ActiveTask<'_>> {
        let mut state = self.lock();

        if state.detector.should_yield(!state.entries.is_empty()) {
            let epoch = state.detector.cohort_epoch();
            trace!("yielding to idle workers");
            while state.detector.is_yield_pending(epoch) {
                state = self.wait(&self.cohort_served, state);
            }
        }

        let mut parked = false;
        let entry = loop {
            if state.detector.is_finished() {
                return None;
            }
            if let Some(entry) = state.entries.pop_front() {
                break entry;
            }
            if state.detector.is_quiescent() {
                state.detector.finish();
                drop(state);
                trace!("queue drained, search finished");
                self.not_empty.notify_all();
                self.cohort_served.notify_all();
                return None;
            }
            state.detector.park();
            parked = true;
            state = self.wait(&self.not_empty, state);
        };

        let release_yielders = parked && state.detector.cohort_served();
        state.detector.on_task_start();
        state.stats.dequeued += 1;
        drop(state);

        if release_yielders {
            self.cohort_served.notify_all();
        }
        Some(ActiveTask { queue: self, entry })
    }

    fn task_end(&self) {
        let drained = {
            let mut state = self.lock();
            state.detector.on_task_end();
            state.detector.is_quiescent() && state.entries.is_empty()
        };
        // Parked workers must see termination even if this worker is exiting.
        if drained {
            self.not_empty.notify_all();
        }
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Number of dequeued directories not yet finished
    pub fn active(&self) -> usize {
        self.lock().detector.active()
    }

    /// Whether some worker has observed termination
    pub fn is_finished(&self) -> bool {
        self.lock().detector.is_finished()
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats
    }
}

/// A dequeued directory. Dropping it marks the directory as finished.
pub struct ActiveTask<'a> {
    queue: &'a WorkQueue,
    entry: PathEntry,
}

impl ActiveTask<'_> {
    pub fn path(&self) -> &PathEntry {
        &self.entry
    }
}

impl Drop for ActiveTask<'_> {
    fn drop(&mut self) {
        self.queue.task_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn entry(path: &str) -> PathEntry {
        PathEntry::new(path).unwrap()
    }

    #[test]
    fn test_path_entry_trailing_separator() {
        assert_eq!(entry("root").as_path(), Path::new("root/"));
        assert_eq!(entry("root/").as_path(), Path::new("root/"));
        assert_eq!(entry("/").as_path(), Path::new("/"));
        assert_eq!(entry("root").to_string(), "root/");
    }

    #[test]
    fn test_path_entry_child() {
        let dir = entry("root/sub");
        assert_eq!(
            dir.child(OsStr::new("foobar.log")),
            PathBuf::from("root/sub/foobar.log")
        );
    }

    #[test]
    fn test_path_entry_rejects_empty() {
        assert!(matches!(
            PathEntry::new(""),
            Err(SearchError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_queue_seeded_with_root() {
        let queue = WorkQueue::new(entry("/test"));
        assert_eq!(queue.len(), 1);

        let task = queue.dequeue().unwrap();
        assert_eq!(task.path(), &entry("/test"));
        assert_eq!(queue.active(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_fifo_order() {
        let queue = WorkQueue::new(entry("root"));
        let root = queue.dequeue().unwrap();
        queue.enqueue(entry("root/a"));
        queue.enqueue(entry("root/b"));
        queue.enqueue(entry("root/c"));
        drop(root);

        let order: Vec<String> = (0..3)
            .map(|_| queue.dequeue().unwrap().path().to_string())
            .collect();
        assert_eq!(order, vec!["root/a/", "root/b/", "root/c/"]);
    }

    #[test]
    fn test_dequeue_terminates_when_drained() {
        let queue = WorkQueue::new(entry("root"));
        drop(queue.dequeue().unwrap());

        assert_eq!(queue.active(), 0);
        assert!(queue.dequeue().is_none());
        assert!(queue.is_finished());

        // Termination is permanent
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_stats_conserved() {
        let queue = WorkQueue::new(entry("root"));
        let root = queue.dequeue().unwrap();
        queue.enqueue(entry("root/a"));
        queue.enqueue(entry("root/b"));
        drop(root);
        while let Some(task) = queue.dequeue() {
            drop(task);
        }

        let stats = queue.stats();
        assert_eq!(stats.enqueued, 3);
        assert_eq!(stats.dequeued, 3);
        assert_eq!(stats.peak_len, 2);
    }

    #[test]
    fn test_parked_workers_wake_on_enqueue() {
        let queue = Arc::new(WorkQueue::new(entry("root")));
        let root = queue.dequeue().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(task) = queue.dequeue() {
                        seen.fetch_add(1, Ordering::SeqCst);
                        drop(task);
                    }
                })
            })
            .collect();

        for i in 0..16 {
            queue.enqueue(entry(&format!("root/{}", i)));
        }
        drop(root);

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(seen.load(Ordering::SeqCst), 16);
        assert!(queue.is_finished());
    }

    #[test]
    fn test_failed_worker_still_releases_waiters() {
        let queue = Arc::new(WorkQueue::new(entry("root")));
        let root = queue.dequeue().unwrap();

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.dequeue().is_none())
        };

        // The holder of the only active task exits without dequeuing again.
        thread::sleep(std::time::Duration::from_millis(50));
        drop(root);

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_parked_worker_gets_entry_before_busy_worker() {
        for _ in 0..50 {
            let queue = Arc::new(WorkQueue::new(entry("root")));
            let root = queue.dequeue().unwrap();

            let idle = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let task = queue.dequeue().unwrap();
                    let taken = task.path().to_string();
                    thread::sleep(std::time::Duration::from_millis(5));
                    queue.enqueue(entry("root/y"));
                    taken
                })
            };

            while !queue.lock().detector.is_cohort_parked() {
                thread::yield_now();
            }

            // The busy worker publishes work and comes straight back for more
            queue.enqueue(entry("root/x"));
            let next = queue.dequeue().unwrap();

            assert_eq!(next.path().to_string(), "root/y/");
            assert_eq!(idle.join().unwrap(), "root/x/");
            drop(next);
            drop(root);
            assert!(queue.dequeue().is_none());
        }
    }

    #[test]
    fn test_concurrent_tree_expansion() {
        // Entries with fewer than five separators fan out three ways: 1 + 3 + 9 + 27 + 81
        let queue = Arc::new(WorkQueue::new(entry("d")));
        let processed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let processed = Arc::clone(&processed);
                thread::spawn(move || {
                    while let Some(task) = queue.dequeue() {
                        let depth = task.path().to_string().matches('/').count();
                        if depth < 5 {
                            for child in ["x", "y", "z"] {
                                let path = task.path().child(OsStr::new(child));
                                queue.enqueue(PathEntry::new(path).unwrap());
                            }
                        }
                        processed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(processed.load(Ordering::SeqCst), 121);
        let stats = queue.stats();
        assert_eq!(stats.enqueued, 121);
        assert_eq!(stats.dequeued, 121);
        assert_eq!(queue.active(), 0);
    }
}
