// src/engine/queue.rs

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::types::TaskName;

/// Bookkeeping between "the graph says it's available" and "an executor is
/// running it".
///
/// - `ready`: available tasks not yet dispatched.
/// - `in_flight`: dispatched tasks that have not reported back.
/// - `stale`: in-flight tasks whose inputs were invalidated after dispatch;
///   their completion must not be trusted.
///
/// A task is never both ready and in flight. `BTreeSet`s keep dispatch
/// order deterministic for a given state.
#[derive(Debug)]
pub struct ReadyQueue {
    max_parallel: usize,
    ready: BTreeSet<TaskName>,
    in_flight: BTreeSet<TaskName>,
    stale: HashSet<TaskName>,
}

impl ReadyQueue {
    /// `max_parallel` is clamped to at least 1.
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            ready: BTreeSet::new(),
            in_flight: BTreeSet::new(),
            stale: HashSet::new(),
        }
    }

    /// Nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Nothing in flight and nothing waiting.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &TaskName> {
        self.in_flight.iter()
    }

    pub fn is_in_flight(&self, task: &str) -> bool {
        self.in_flight.contains(task)
    }

    /// Add newly available tasks, skipping those already running.
    pub fn push_ready(&mut self, tasks: impl IntoIterator<Item = TaskName>) {
        for task in tasks {
            if !self.in_flight.contains(&task) {
                self.ready.insert(task);
            }
        }
    }

    /// Replace the waiting set with `available` minus whatever is in flight.
    pub fn resync(&mut self, available: HashSet<TaskName>) {
        self.ready = available
            .into_iter()
            .filter(|task| !self.in_flight.contains(task))
            .collect();
        debug!(ready = self.ready.len(), "resynced ready queue");
    }

    /// Drop `task` from the waiting set, e.g. once it completed without
    /// having been dispatched.
    pub fn forget(&mut self, task: &str) {
        if self.ready.remove(task) {
            debug!(task = %task, "removed completed task from ready queue");
        }
    }

    /// Record that an in-flight task's completion must be discarded.
    pub fn mark_stale(&mut self, task: &str) {
        if self.in_flight.contains(task) && self.stale.insert(task.to_string()) {
            debug!(task = %task, "in-flight task marked stale");
        }
    }

    /// Remove `task` from the in-flight set.
    ///
    /// Returns `(was_in_flight, was_stale)`.
    pub fn finish(&mut self, task: &str) -> (bool, bool) {
        let was_in_flight = self.in_flight.remove(task);
        let was_stale = self.stale.remove(task);
        (was_in_flight, was_stale)
    }

    /// Move as many ready tasks to in-flight as `max_parallel` allows.
    pub fn take_dispatch(&mut self) -> Vec<TaskName> {
        let mut dispatch = Vec::new();

        while self.in_flight.len() < self.max_parallel {
            let Some(task) = self.ready.pop_first() else {
                break;
            };
            self.in_flight.insert(task.clone());
            dispatch.push(task);
        }

        if !dispatch.is_empty() {
            debug!(
                ?dispatch,
                in_flight = self.in_flight.len(),
                waiting = self.ready.len(),
                "dispatching tasks"
            );
        }

        dispatch
    }
}
