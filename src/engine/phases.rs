// src/engine/phases.rs

//! A first coordinator run followed by one more run per planned
//! invalidation.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dag::{CombinatorGraph, Schedule};
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::TaskName;

use super::core::CoreRuntime;
use super::runtime::Runtime;
use super::{RedoMode, RuntimeOptions, SchedulerEvent};

/// Capacity of each run's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A redo applied between two runs.
#[derive(Debug, Clone)]
pub struct Invalidation {
    pub task: TaskName,
    pub mode: RedoMode,
    /// Tasks whose completion was withdrawn.
    pub undone: HashSet<TaskName>,
}

/// One coordinator run.
#[derive(Debug, Clone)]
pub struct Phase {
    /// `None` for the first run.
    pub invalidation: Option<Invalidation>,
    /// Tasks in the order their completions were accepted.
    pub order: Vec<TaskName>,
}

/// Result of [`run_phases`].
#[derive(Debug, Clone)]
pub struct PhasedRun {
    pub graph: CombinatorGraph,
    pub phases: Vec<Phase>,
    /// A shutdown request ended a run; later invalidations were skipped.
    pub interrupted: bool,
}

/// Apply `mode` to `task` on any schedule keyed by task name.
pub fn invalidate<S>(schedule: &mut S, task: &str, mode: RedoMode) -> HashSet<TaskName>
where
    S: Schedule<Task = TaskName>,
{
    match mode {
        RedoMode::Forward => schedule.redo(task),
        RedoMode::Bidirectional => schedule.bidirectional_redo(task),
    }
}

/// Run `graph` to completion, then for each planned invalidation apply it
/// and run again.
///
/// Every run gets a fresh event channel; `make_executor` receives its
/// sender and builds the backend for that run. Once a run is interrupted
/// no further invalidation is applied.
pub async fn run_phases<E, F>(
    mut graph: CombinatorGraph,
    options: RuntimeOptions,
    invalidations: &[(TaskName, RedoMode)],
    mut make_executor: F,
) -> Result<PhasedRun>
where
    E: ExecutorBackend,
    F: FnMut(mpsc::Sender<SchedulerEvent>) -> E,
{
    let mut phases = Vec::with_capacity(invalidations.len() + 1);
    let mut pending = invalidations.iter();
    let mut invalidation = None;

    loop {
        let (tx, rx) = mpsc::channel::<SchedulerEvent>(EVENT_CHANNEL_CAPACITY);
        let executor = make_executor(tx);
        let report = Runtime::new(CoreRuntime::new(graph, options), rx, executor)
            .run()
            .await?;

        graph = report.graph;
        phases.push(Phase {
            invalidation: invalidation.take(),
            order: report.order,
        });

        if report.interrupted {
            let skipped = pending.len();
            if skipped > 0 {
                warn!(skipped, "run interrupted; skipping remaining invalidations");
            }
            return Ok(PhasedRun {
                graph,
                phases,
                interrupted: true,
            });
        }

        let Some((task, mode)) = pending.next() else {
            break;
        };

        let undone = invalidate(&mut graph, task, *mode);
        info!(task = %task, ?mode, undone = undone.len(), "starting another run");
        invalidation = Some(Invalidation {
            task: task.clone(),
            mode: *mode,
            undone,
        });
    }

    Ok(PhasedRun {
        graph,
        phases,
        interrupted: false,
    })
}
