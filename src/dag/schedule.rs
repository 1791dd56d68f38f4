// src/dag/schedule.rs

//! The operation surface shared by [`TaskGraph`] and [`CombinatorGraph`].
//!
//! [`CombinatorGraph`]: crate::dag::CombinatorGraph

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use crate::dag::graph::TaskGraph;
use crate::types::{Combinator, TaskId};

/// Register/query/complete/invalidate over a dependency graph.
///
/// Consumers (the execution driver, the coordinator, the renderer) are
/// written against this trait so a combinator graph can stand in wherever a
/// plain AND graph is expected.
///
/// Operations naming a task that was never seen are not errors: queries
/// answer "not completed / not available" and mutations are ignored.
pub trait Schedule {
    type Task: TaskId;

    /// Read-only view of topology and completion marks.
    fn graph(&self) -> &TaskGraph<Self::Task>;

    /// Combinator used for `task` (AND unless declared otherwise).
    fn kind_of<Q>(&self, task: &Q) -> Combinator
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Tasks that are not completed and whose predecessors satisfy their
    /// combinator. Recomputed from current state on every call.
    fn available(&self) -> HashSet<Self::Task>;

    /// Mark `task` completed; returns the tasks that became available
    /// because of it. Completing twice returns an empty set.
    fn complete<Q>(&mut self, task: &Q) -> HashSet<Self::Task>
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized;

    /// Un-complete `task` and everything that transitively depends on it.
    /// Returns that closure, `task` included.
    fn redo<Q>(&mut self, task: &Q) -> HashSet<Self::Task>
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized;

    /// Like [`Schedule::redo`], but also un-completes everything `task`
    /// transitively depends on.
    fn bidirectional_redo<Q>(&mut self, task: &Q) -> HashSet<Self::Task>
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized;

    /// Clear every completion mark.
    fn reset(&mut self);

    /// `true` once every known task is completed.
    fn is_done(&self) -> bool {
        let graph = self.graph();
        graph.completed().len() == graph.len()
    }

    fn uncompleted(&self) -> HashSet<Self::Task> {
        let graph = self.graph();
        graph
            .tasks()
            .filter(|task| !graph.completed().contains(*task))
            .cloned()
            .collect()
    }

    fn is_completed<Q>(&self, task: &Q) -> bool
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.graph().completed().contains(task)
    }

    fn is_available<Q>(&self, task: &Q) -> bool
    where
        Self::Task: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.graph().is_available_as(task, self.kind_of(task))
    }
}
