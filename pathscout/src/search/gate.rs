//! One-shot start barrier for the worker pool.
//!
//! Every worker registers on arrival and then blocks. The driver waits until
//! the whole pool has registered, then opens the gate once, releasing all of
//! them together. Nobody touches the filesystem while the pool is still
//! being built.

use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// How the gate was released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Start searching
    Start,
    /// The pool could not be built; exit without doing any work
    Abort,
}

#[derive(Debug)]
struct GateState {
    pool_size: usize,
    registered: usize,
    release: Option<Release>,
}

#[derive(Debug)]
pub struct StartGate {
    state: Mutex<GateState>,
    all_registered: Condvar,
    released: Condvar,
}

impl StartGate {
    pub fn new(pool_size: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(GateState {
                pool_size: pool_size.get(),
                registered: 0,
                release: None,
            }),
            all_registered: Condvar::new(),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker side: register, then block until the driver opens or aborts.
    pub fn arrive_and_wait(&self) -> Release {
        let mut state = self.lock();
        state.registered += 1;
        if state.registered == state.pool_size {
            self.all_registered.notify_all();
        }

        loop {
            if let Some(release) = state.release {
                return release;
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Driver side: block until every worker of the pool has registered.
    pub fn wait_all_registered(&self) {
        let mut state = self.lock();
        while state.registered < state.pool_size && state.release.is_none() {
            state = self
                .all_registered
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Releases every registered worker to start. Only the first release counts.
    pub fn open(&self) -> bool {
        self.release(Release::Start)
    }

    /// Releases every registered worker with orders to exit.
    pub fn abort(&self) -> bool {
        self.release(Release::Abort)
    }

    fn release(&self, release: Release) -> bool {
        let mut state = self.lock();
        if state.release.is_some() {
            return false;
        }
        state.release = Some(release);
        drop(state);
        self.released.notify_all();
        self.all_registered.notify_all();
        true
    }

    pub fn registered(&self) -> usize {
        self.lock().registered
    }
}
