// src/dag/graph.rs

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::{debug, warn};

use crate::dag::schedule::Schedule;
use crate::errors::{Result, TaskdagError};
use crate::types::{Combinator, TaskId, TaskName};

/// Internal node structure: stores immediate predecessors and successors.
#[derive(Debug, Clone)]
struct TaskNode<T> {
    /// Tasks that must complete before this one.
    predecessors: HashSet<T>,
    /// Tasks that list this one as a predecessor.
    successors: HashSet<T>,
}

impl<T> Default for TaskNode<T> {
    fn default() -> Self {
        Self {
            predecessors: HashSet::new(),
            successors: HashSet::new(),
        }
    }
}

/// Which adjacency set a closure walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Follow `successors`: everything that depends on the start task.
    Downstream,
    /// Follow `predecessors`: everything the start task depends on.
    Upstream,
}

/// In-memory dependency graph with pure AND semantics.
///
/// A task is known as soon as it is declared or named as someone else's
/// dependency. Edges are only ever added; completion marks are the only
/// state that moves in both directions.
///
/// Both adjacency directions are stored on every node, and every edge
/// insertion updates both ends, so `u ∈ predecessors[t] ⇔ t ∈ successors[u]`
/// holds after every mutation. See [`TaskGraph::check_symmetry`].
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskId = TaskName> {
    nodes: HashMap<T, TaskNode<T>>,
    completed: HashSet<T>,
}

impl<T: TaskId> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TaskId> TaskGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            completed: HashSet::new(),
        }
    }

    /// Declare `task` with the given predecessors.
    ///
    /// Every dependency becomes a known task. Fails with
    /// [`TaskdagError::Redeclared`] if `task` already has a non-empty
    /// predecessor set; in that case the graph is left untouched.
    ///
    /// A task that was declared without dependencies, or only seen as a
    /// dependency so far, can still be declared properly.
    pub fn declare<D>(
        &mut self,
        task: impl Into<T>,
        dependencies: impl IntoIterator<Item = D>,
    ) -> Result<()>
    where
        D: Into<T>,
    {
        let task = task.into();
        let dependencies: HashSet<T> = dependencies.into_iter().map(Into::into).collect();

        if let Some(existing) = self.nodes.get(&task) {
            if !existing.predecessors.is_empty() {
                return Err(TaskdagError::Redeclared(format!("{task:?}")));
            }
        }

        for dep in &dependencies {
            self.nodes
                .entry(dep.clone())
                .or_default()
                .successors
                .insert(task.clone());
        }

        debug!(task = ?task, deps = dependencies.len(), "declared task");
        self.nodes.entry(task).or_default().predecessors = dependencies;

        Ok(())
    }

    /// Declare a task without dependencies.
    pub fn declare_leaf(&mut self, task: impl Into<T>) -> Result<()> {
        self.declare(task, std::iter::empty::<T>())
    }

    /// All known tasks, including those only seen as dependencies.
    pub fn tasks(&self) -> impl Iterator<Item = &T> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains<Q>(&self, task: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.nodes.contains_key(task)
    }

    /// Immediate predecessors of a task (empty for unknown tasks).
    pub fn predecessors_of<Q>(&self, task: &Q) -> impl Iterator<Item = &T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.nodes
            .get(task)
            .into_iter()
            .flat_map(|node| node.predecessors.iter())
    }

    /// Immediate successors of a task (empty for unknown tasks).
    pub fn successors_of<Q>(&self, task: &Q) -> impl Iterator<Item = &T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.nodes
            .get(task)
            .into_iter()
            .flat_map(|node| node.successors.iter())
    }

    /// Every edge as a `(predecessor, successor)` pair.
    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> {
        self.nodes.iter().flat_map(|(task, node)| {
            node.successors.iter().map(move |succ| (task, succ))
        })
    }

    /// Tasks currently marked as completed.
    pub fn completed(&self) -> &HashSet<T> {
        &self.completed
    }

    /// Verify that the two adjacency directions agree on every edge.
    pub fn check_symmetry(&self) -> Result<()> {
        for (task, node) in &self.nodes {
            for succ in &node.successors {
                let mirrored = self
                    .nodes
                    .get(succ)
                    .is_some_and(|n| n.predecessors.contains(task));
                if !mirrored {
                    return Err(TaskdagError::AsymmetricEdge(format!(
                        "{succ:?} is a successor of {task:?} but does not list it as a predecessor"
                    )));
                }
            }

            for pred in &node.predecessors {
                let mirrored = self
                    .nodes
                    .get(pred)
                    .is_some_and(|n| n.successors.contains(task));
                if !mirrored {
                    return Err(TaskdagError::AsymmetricEdge(format!(
                        "{pred:?} is a predecessor of {task:?} but does not list it as a successor"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether the predecessors of `task` satisfy `kind`.
    ///
    /// This is the single eligibility rule shared by both graph flavours.
    /// Unknown tasks are never eligible; tasks without predecessors always are.
    pub(crate) fn is_eligible_as<Q>(&self, task: &Q, kind: Combinator) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.nodes
            .get(task)
            .is_some_and(|node| self.node_eligible(node, kind))
    }

    fn node_eligible(&self, node: &TaskNode<T>, kind: Combinator) -> bool {
        if node.predecessors.is_empty() {
            return true;
        }

        let mut done = node
            .predecessors
            .iter()
            .map(|pred| self.completed.contains(pred));

        match kind {
            Combinator::And => done.all(|d| d),
            Combinator::Or => done.any(|d| d),
        }
    }

    pub(crate) fn is_available_as<Q>(&self, task: &Q, kind: Combinator) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        !self.completed.contains(task) && self.is_eligible_as(task, kind)
    }

    fn key_available(&self, task: &T, kind: Combinator) -> bool {
        !self.completed.contains(task)
            && self
                .nodes
                .get(task)
                .is_some_and(|node| self.node_eligible(node, kind))
    }

    pub(crate) fn available_by<F>(&self, kind_of: F) -> HashSet<T>
    where
        F: Fn(&T) -> Combinator,
    {
        self.nodes
            .keys()
            .filter(|&task| self.key_available(task, kind_of(task)))
            .cloned()
            .collect()
    }

    /// Mark `task` completed and return the successors that became available.
    ///
    /// Only direct successors can change eligibility, so only they are
    /// re-evaluated. A successor counts as new only if it was not available
    /// before this completion (an OR task may already have been).
    pub(crate) fn complete_by<Q, F>(&mut self, task: &Q, kind_of: F) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
        F: Fn(&T) -> Combinator,
    {
        let Some(key) = self.nodes.get_key_value(task).map(|(key, _)| key.clone()) else {
            warn!(task = ?task, "completion for unknown task; ignoring");
            return HashSet::new();
        };
        self.complete_key(key, kind_of)
    }

    fn complete_key<F>(&mut self, key: T, kind_of: F) -> HashSet<T>
    where
        F: Fn(&T) -> Combinator,
    {
        if self.completed.contains(&key) {
            debug!(task = ?key, "task already completed; nothing new becomes available");
            return HashSet::new();
        }

        let successors: Vec<T> = self
            .nodes
            .get(&key)
            .map(|node| node.successors.iter().cloned().collect())
            .unwrap_or_default();

        let before: HashSet<T> = successors
            .iter()
            .filter(|&succ| self.key_available(succ, kind_of(succ)))
            .cloned()
            .collect();

        self.completed.insert(key.clone());

        let newly: HashSet<T> = successors
            .into_iter()
            .filter(|succ| !before.contains(succ) && self.key_available(succ, kind_of(succ)))
            .collect();

        debug!(task = ?key, newly_available = ?newly, "task completed");
        newly
    }

    /// Un-complete the closure of `task` in each of `directions`.
    ///
    /// Returns the union of the closures, `task` included. Unknown tasks are
    /// ignored.
    pub(crate) fn invalidate<Q>(&mut self, task: &Q, directions: &[Direction]) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let Some(start) = self.nodes.get_key_value(task).map(|(key, _)| key.clone()) else {
            warn!(task = ?task, "invalidation of unknown task; ignoring");
            return HashSet::new();
        };
        self.invalidate_from(&start, directions)
    }

    fn invalidate_from(&mut self, start: &T, directions: &[Direction]) -> HashSet<T> {
        let mut undone: HashSet<T> = HashSet::new();
        for &direction in directions {
            undone.extend(self.closure(start, direction));
        }

        let mut reopened = 0usize;
        for t in &undone {
            if self.completed.remove(t) {
                reopened += 1;
            }
        }

        debug!(
            task = ?start,
            ?directions,
            undone = undone.len(),
            reopened,
            "invalidated tasks"
        );
        undone
    }

    /// Every task reachable from `start` in `direction`, `start` included.
    ///
    /// Iterative worklist plus visited set: diamonds are visited once and
    /// accidental cycles terminate.
    fn closure(&self, start: &T, direction: Direction) -> HashSet<T> {
        let mut stack: Vec<&T> = vec![start];
        let mut visited: HashSet<T> = HashSet::new();

        while let Some(task) = stack.pop() {
            if !visited.insert(task.clone()) {
                continue;
            }

            if let Some(node) = self.nodes.get(task) {
                let next = match direction {
                    Direction::Downstream => &node.successors,
                    Direction::Upstream => &node.predecessors,
                };
                stack.extend(next.iter().filter(|n| !visited.contains(*n)));
            }
        }

        visited
    }

    pub(crate) fn clear_completed(&mut self) {
        debug!(cleared = self.completed.len(), "clearing completion marks");
        self.completed.clear();
    }
}

impl<T: TaskId> Schedule for TaskGraph<T> {
    type Task = T;

    fn graph(&self) -> &TaskGraph<T> {
        self
    }

    fn kind_of<Q>(&self, _task: &Q) -> Combinator
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Combinator::And
    }

    fn available(&self) -> HashSet<T> {
        self.available_by(|_| Combinator::And)
    }

    fn complete<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.complete_by(task, |_| Combinator::And)
    }

    fn redo<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.invalidate(task, &[Direction::Downstream])
    }

    fn bidirectional_redo<Q>(&mut self, task: &Q) -> HashSet<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.invalidate(task, &[Direction::Downstream, Direction::Upstream])
    }

    fn reset(&mut self) {
        self.clear_completed();
    }
}
