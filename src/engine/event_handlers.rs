// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{CombinatorGraph, Schedule};
use crate::engine::queue::ReadyQueue;
use crate::engine::{RedoMode, RuntimeOptions};
use crate::types::TaskName;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<TaskName>),
    /// Request that the coordinator stops (nothing left to run).
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the queue from the graph's current `available()` set.
pub fn start_run(
    graph: &CombinatorGraph,
    queue: &mut ReadyQueue,
    options: &RuntimeOptions,
) -> CoreStep {
    queue.resync(graph.available());
    finish_step(graph, queue, options)
}

/// Handle a completion reported by an executor.
///
/// - Stale completions (inputs invalidated while the task ran) are dropped;
///   if the task is available again it is queued to run once more.
/// - Duplicate completions are harmless no-ops.
/// - Completions for tasks that are not available (unknown, or never
///   eligible) are ignored.
pub fn handle_task_completion(
    graph: &mut CombinatorGraph,
    queue: &mut ReadyQueue,
    order: &mut Vec<TaskName>,
    options: &RuntimeOptions,
    task: TaskName,
) -> CoreStep {
    let (was_in_flight, was_stale) = queue.finish(&task);

    if !was_in_flight {
        debug!(task = %task, "completion for a task that was not dispatched");
    }

    if was_stale {
        info!(task = %task, "discarding completion of invalidated task");
        if graph.is_available(&task) {
            queue.push_ready([task]);
        }
    } else if graph.is_completed(&task) {
        debug!(task = %task, "duplicate completion; nothing to do");
    } else if !graph.is_available(&task) {
        warn!(task = %task, "completion for task that is not available; ignoring");
    } else {
        let newly = graph.complete(&task);
        queue.forget(&task);
        order.push(task);
        queue.push_ready(newly);
    }

    finish_step(graph, queue, options)
}

/// Handle a redo request.
///
/// In-flight tasks caught by the invalidation, or no longer eligible after
/// it, are marked stale; the ready queue is rebuilt from `available()`.
pub fn handle_redo(
    graph: &mut CombinatorGraph,
    queue: &mut ReadyQueue,
    options: &RuntimeOptions,
    task: TaskName,
    mode: RedoMode,
) -> CoreStep {
    let undone = match mode {
        RedoMode::Forward => graph.redo(&task),
        RedoMode::Bidirectional => graph.bidirectional_redo(&task),
    };
    info!(task = %task, ?mode, undone = ?undone, "redo requested");

    let stale: Vec<TaskName> = queue
        .in_flight()
        .filter(|t| undone.contains(*t) || !graph.is_available(*t))
        .cloned()
        .collect();
    for t in &stale {
        queue.mark_stale(t);
    }

    queue.resync(graph.available());
    finish_step(graph, queue, options)
}

/// Dispatch what fits and decide whether the coordinator keeps running.
fn finish_step(
    graph: &CombinatorGraph,
    queue: &mut ReadyQueue,
    options: &RuntimeOptions,
) -> CoreStep {
    let mut commands = Vec::new();

    let dispatch = queue.take_dispatch();
    if !dispatch.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatch));
    }

    let mut keep_running = true;

    // Nothing in flight after dispatching means nothing was ready either.
    if queue.is_idle() {
        if graph.is_done() {
            info!(tasks = graph.graph().len(), "all tasks completed");
        } else {
            warn!(
                uncompleted = ?graph.uncompleted(),
                "no task can be started but the schedule is not done"
            );
        }

        if options.exit_when_done {
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }
    }

    CoreStep {
        commands,
        keep_running,
    }
}
