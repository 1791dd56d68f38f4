// src/engine/mod.rs

//! Single-owner coordinator for concurrent execution.
//!
//! The graph types are plain data with no locking. When tasks run in
//! parallel, every mutation (`complete`, `redo`, `bidirectional_redo`) goes
//! through one owner that receives [`SchedulerEvent`]s over a channel:
//!
//! - [`core`] is the pure, synchronous state machine (graph + ready queue).
//! - [`runtime`] is the async shell that reads events and talks to an
//!   [`ExecutorBackend`](crate::exec::ExecutorBackend).
//! - [`queue`] tracks which available tasks are waiting and which are in
//!   flight.
//! - [`phases`] chains coordinator runs with the invalidations between them.

use crate::dag::CombinatorGraph;
use crate::types::TaskName;

/// Which invalidation a redo request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedoMode {
    /// The task and everything downstream of it.
    Forward,
    /// The task, everything downstream and everything upstream.
    Bidirectional,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Maximum number of dispatched tasks that have not reported back yet.
    pub max_parallel: usize,
    /// If true, stop once nothing is in flight and nothing can be dispatched.
    /// Otherwise keep waiting for redo requests until shutdown.
    pub exit_when_done: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            exit_when_done: true,
        }
    }
}

/// Events flowing into the coordinator from executors and callers.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// A dispatched task finished.
    TaskCompleted { task: TaskName },
    /// A task (and its closure) must be done again.
    RedoRequested { task: TaskName, mode: RedoMode },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// What a finished coordinator hands back.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Final graph state, including completion marks.
    pub graph: CombinatorGraph,
    /// Tasks in the order their completions were accepted.
    pub order: Vec<TaskName>,
    /// The run ended on `ShutdownRequested` rather than running out of work.
    pub interrupted: bool,
}

pub mod core;
pub mod event_handlers;
pub mod phases;
pub mod queue;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use phases::{Invalidation, Phase, PhasedRun, run_phases};
pub use queue::ReadyQueue;
pub use runtime::Runtime;
