//! This module implements the parallel directory-tree search.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │           engine             │
//!                 │  spawn pool, open gate, join │
//!                 └──────────────┬───────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!  ┌─────▼─────┐           ┌─────▼─────┐           ┌─────▼─────┐
//!  │ Worker 0  │           │ Worker 1  │    ...    │ Worker N  │
//!  │ read_dir  │           │ read_dir  │           │ read_dir  │
//!  └─────┬─────┘           └─────┬─────┘           └─────┬─────┘
//!        └───────────────────────┼───────────────────────┘
//!                                │ enqueue / dequeue
//!                 ┌──────────────▼───────────────┐
//!                 │          WorkQueue           │
//!                 │  FIFO + QuiescenceDetector   │
//!                 └──────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! 1. The driver seeds the queue with the root and spawns a fixed pool.
//! 2. Each worker registers at the [`StartGate`] and blocks.
//! 3. Once the pool is complete the driver opens the gate.
//! 4. Workers loop: dequeue a directory, list it, report matching files and
//!    symlinks, enqueue readable sub-directories.
//! 5. When the queue is empty and no directory is in flight, `dequeue`
//!    returns `None` everywhere and the workers exit.
//! 6. The driver joins every worker and folds their results into a
//!    [`SearchOutcome`](crate::results::SearchOutcome).
//!
//! No lock is held while a worker is reading the filesystem; the queue lock
//! covers only the pending entries and the active count.

pub mod coordinator;
pub mod engine;
pub mod gate;
pub mod matcher;
pub mod queue;
pub mod worker;

pub use coordinator::QuiescenceDetector;
pub use engine::{search, search_with_reporter, SearchContext};
pub use gate::{Release, StartGate};
pub use matcher::NameMatcher;
pub use queue::{ActiveTask, PathEntry, QueueStats, WorkQueue};
pub use worker::{EntryKind, Worker};
