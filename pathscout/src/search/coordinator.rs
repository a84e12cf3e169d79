//! Termination detection and dequeue fairness.
//!
//! [`QuiescenceDetector`] is plain state with no locking of its own. It lives
//! inside the [`WorkQueue`](super::queue::WorkQueue) monitor, so every read of
//! the active count happens under the same lock as the queue's emptiness
//! check. That is what makes "queue empty and nobody active" a stable
//! observation: no worker can be halfway between finishing a directory and
//! enqueueing its children while another worker looks.
//!
//! # Termination
//!
//! A directory is *active* from the moment it is dequeued until its
//! [`ActiveTask`](super::queue::ActiveTask) is dropped. Only active
//! directories can produce new queue entries, so once the queue is empty and
//! the active count is zero no work can ever appear again. The first worker
//! to observe that calls [`QuiescenceDetector::finish`] and wakes everyone.
//!
//! # Fairness
//!
//! Workers that found the queue empty form an *idle cohort* and park. When
//! work shows up, a worker that was busy elsewhere could race in and take it
//! before any parked worker is scheduled. To prevent that, a worker arriving
//! at a non-empty queue while a cohort is parked yields until some cohort
//! member has dequeued. Each time the cohort is served the epoch advances,
//! which is what yielding workers wait on.
//!
//! This is a best-effort ordering rule, not a strict FIFO of waiters: it only
//! holds back workers that arrive while entries are already queued.

/// Active-worker count, idle-cohort flag and the terminal flag for one search.
#[derive(Debug, Default)]
pub struct QuiescenceDetector {
    active: usize,
    cohort_parked: bool,
    cohort_epoch: u64,
    finished: bool,
}

impl QuiescenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory was dequeued.
    pub fn on_task_start(&mut self) {
        self.active += 1;
    }

    /// A dequeued directory is done, successfully or not.
    pub fn on_task_end(&mut self) {
        debug_assert!(self.active > 0, "task ended with no active tasks");
        self.active = self.active.saturating_sub(1);
    }

    /// Number of directories currently being processed
    pub fn active(&self) -> usize {
        self.active
    }

    /// No directory is being processed
    pub fn is_quiescent(&self) -> bool {
        self.active == 0
    }

    /// Enters the terminal state. Only valid once the queue is empty and quiescent.
    pub fn finish(&mut self) {
        debug_assert!(self.is_quiescent());
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The calling worker is about to park on the empty queue.
    pub fn park(&mut self) {
        self.cohort_parked = true;
    }

    pub fn is_cohort_parked(&self) -> bool {
        self.cohort_parked
    }

    pub fn cohort_epoch(&self) -> u64 {
        self.cohort_epoch
    }

    /// Whether a worker arriving now must step aside for the idle cohort.
    pub fn should_yield(&self, queue_has_work: bool) -> bool {
        queue_has_work && self.cohort_parked && !self.finished
    }

    /// Whether a worker that started yielding at `epoch` must keep waiting.
    pub fn is_yield_pending(&self, epoch: u64) -> bool {
        self.cohort_parked && self.cohort_epoch == epoch && !self.finished
    }

    /// A cohort member dequeued. Returns true if yielding workers should be woken.
    pub fn cohort_served(&mut self) -> bool {
        if !self.cohort_parked {
            return false;
        }
        self.cohort_parked = false;
        self.cohort_epoch = self.cohort_epoch.wrapping_add(1);
        true
    }
}
