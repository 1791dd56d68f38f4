// src/dag/combinator.rs

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::graph::{Direction, TaskGraph};
use crate::dag::schedule::Schedule;
use crate::errors::Result;
use crate::types::{Combinator, TaskId, TaskName};

/// Dependency graph where each task chooses how to combine its predecessors.
///
/// Edge and completion bookkeeping is delegated to an inner [`TaskGraph`];
/// this type only adds the per-task [`Combinator`]. Tasks known only as
/// someone's dependency are AND tasks.
#[derive(Debug, Clone)]
pub struct CombinatorGraph<T: TaskId = TaskName> {
    graph: TaskGraph<T>,
    kinds: HashMap<T, Combinator>,
}

impl<T: TaskId> Default for CombinatorGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TaskId> CombinatorGraph<T> {
    pub fn new() -> Self {
        Self {
            graph: TaskGraph::new(),
            kinds: HashMap::new(),
        }
    }

    /// Declare `task` with the given predecessors and combinator.
    ///
    /// Same redeclaration rule as [`TaskGraph::declare`]; a rejected
    /// declaration leaves both topology and kinds untouched.
    pub fn declare<D>(
        &mut self,
        task: impl Into<T>,
        dependencies: impl IntoIterator<Item = D>,
        kind: Combinator,
    ) -> Result<()>
    where
        D: Into<T>,
    {
        let task = task.into();
        self.graph.declare(task.clone(), dependencies)?;
        self.kinds.insert(task, kind);
        Ok(())
    }

    /// Declare a task that waits for *all* of `dependencies`.
    pub fn declare_and<D>(
        &mut self,
        task: impl Into<T>,
        dependencies: impl IntoIterator<Item = D>,
    ) -> Result<()>
    where
        D: Into<T>,
    {
        self.declare(task, dependencies, Combinator::And)
    }

    /// Declare a task that waits for *any one* of `dependencies`.
    pub fn declare_or<D>(
        &mut self,
        task: impl Into<T>,
        dependencies: impl IntoIterator<Item = D>,
    ) -> Result<()>
    where
        D: Into<T>,
    {
        self.declare(task, dependencies, Combinator::Or)
    }

    pub fn declare_leaf(&mut self, task: impl Into<T>) -> Result<()> {
        self.declare(task, std::iter::empty::<T>(), Combinator::And)
    }
}

impl CombinatorGraph<TaskName> {
    /// Build a graph from a validated [`ConfigFile`].
    ///
    /// Tasks are declared in name order; each uses its own `kind`, falling
    /// back to `[default].kind`.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut graph = Self::new();
        let default_kind = cfg.default.kind;

        for (name, task) in cfg.task.iter() {
            let kind = task.effective_kind(default_kind);
            graph.declare(name.clone(), task.after.iter().cloned(), kind)?;
        }

        debug!(tasks = graph.graph.len(), "built combinator graph from config");
        Ok(graph)
    }
}

fn kind_in<T: TaskId>(kinds: &HashMap<T, Combinator>, task: &T) -> Combinator {
    kinds.get(task).copied().unwrap_or_default()
}

impl<T: TaskId> Schedule for CombinatorGraph<T> {
    type Task = T;

    fn graph(&self) -> &TaskGraph<T> {
        &self.graph
    }

    fn kind_of<Q>(&self, task: &Q) -> Combinator
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.kinds.get(task).copied().unwrap_or_default()
    }

    fn available(&self) -> HashSet<T> {
        self.graph.available_by(|task| kind_in(&self.kinds, task))
    }

    fn complete<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let kinds = &self.kinds;
        self.graph.complete_by(task, |t| kind_in(kinds, t))
    }

    fn redo<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.graph.invalidate(task, &[Direction::Downstream])
    }

    fn bidirectional_redo<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.graph.invalidate(task, &[Direction::Downstream, Direction::Upstream])
    }

    fn reset(&mut self) {
        self.graph.clear_completed();
    }
}
