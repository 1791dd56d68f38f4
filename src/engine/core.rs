// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`SchedulerEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! It has no channels, no Tokio types and performs no IO, so it can be
//! stepped by hand in tests.

use crate::dag::CombinatorGraph;
use crate::engine::event_handlers::{CoreStep, handle_redo, handle_task_completion, start_run};
use crate::engine::queue::ReadyQueue;
use crate::engine::{RunReport, RuntimeOptions, SchedulerEvent};
use crate::types::TaskName;

/// Pure core runtime state: the graph, the ready queue and the order in
/// which completions were accepted.
#[derive(Debug)]
pub struct CoreRuntime {
    graph: CombinatorGraph,
    queue: ReadyQueue,
    options: RuntimeOptions,
    order: Vec<TaskName>,
    interrupted: bool,
}

impl CoreRuntime {
    pub fn new(graph: CombinatorGraph, options: RuntimeOptions) -> Self {
        let queue = ReadyQueue::new(options.max_parallel);
        Self {
            graph,
            queue,
            options,
            order: Vec::new(),
            interrupted: false,
        }
    }

    /// Dispatch whatever is available in the graph's current state.
    pub fn start(&mut self) -> CoreStep {
        start_run(&self.graph, &mut self.queue, &self.options)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SchedulerEvent) -> CoreStep {
        match event {
            SchedulerEvent::TaskCompleted { task } => handle_task_completion(
                &mut self.graph,
                &mut self.queue,
                &mut self.order,
                &self.options,
                task,
            ),
            SchedulerEvent::RedoRequested { task, mode } => {
                handle_redo(&mut self.graph, &mut self.queue, &self.options, task, mode)
            }
            SchedulerEvent::ShutdownRequested => {
                self.interrupted = true;
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    pub fn graph(&self) -> &CombinatorGraph {
        &self.graph
    }

    pub fn queue(&self) -> &ReadyQueue {
        &self.queue
    }

    /// Tasks in the order their completions were accepted.
    pub fn completion_order(&self) -> &[TaskName] {
        &self.order
    }

    /// Whether a shutdown request ended this run.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            graph: self.graph,
            order: self.order,
            interrupted: self.interrupted,
        }
    }
}
