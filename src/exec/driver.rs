// src/exec/driver.rs

//! Sequential random-order execution driver.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::dag::Schedule;

/// Runs a schedule one task at a time, picking uniformly at random among
/// the tasks currently in process.
///
/// The working set is fetched lazily from [`Schedule::available`] and then
/// kept up to date with the sets returned by [`Schedule::complete`].
/// Invalidating through the driver drops the working set so the next step
/// asks the schedule again.
#[derive(Debug)]
pub struct RunSchedule<S: Schedule> {
    schedule: S,
    /// `None` means "unknown; ask the schedule on the next step".
    in_process: Option<HashSet<S::Task>>,
    rng: StdRng,
}

impl<S: Schedule> RunSchedule<S> {
    /// Wrap `schedule`. With a seed, the sequence of picks is reproducible.
    pub fn new(schedule: S, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            schedule,
            in_process: None,
            rng,
        }
    }

    /// Clear all completion marks and forget the working set.
    pub fn reset(&mut self) {
        self.schedule.reset();
        self.in_process = None;
    }

    /// Complete one task. Returns it, or `None` if nothing can be done.
    pub fn step(&mut self) -> Option<S::Task> {
        let in_process = self
            .in_process
            .get_or_insert_with(|| self.schedule.available());

        // Sorting makes the pick depend only on the rng, not on hash order.
        let task = {
            let mut candidates: Vec<&S::Task> = in_process.iter().collect();
            candidates.sort();
            (*candidates.choose(&mut self.rng)?).clone()
        };

        in_process.remove(&task);
        let newly = self.schedule.complete(&task);
        debug!(task = ?task, newly_available = ?newly, "driver completed task");
        in_process.extend(newly);

        Some(task)
    }

    /// Step until nothing is left to do; returns the completion order.
    pub fn run(&mut self) -> Vec<S::Task> {
        let mut order = Vec::new();
        while let Some(task) = self.step() {
            order.push(task);
        }

        if self.schedule.is_done() {
            info!(steps = order.len(), "schedule completed");
        } else {
            warn!(
                uncompleted = ?self.schedule.uncompleted(),
                "there are tasks that could not be completed"
            );
        }

        order
    }

    /// Forward redo through the driver.
    pub fn redo<Q>(&mut self, task: &Q) -> HashSet<S::Task>
    where
        S::Task: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.in_process = None;
        self.schedule.redo(task)
    }

    /// Bidirectional redo through the driver.
    pub fn cooking_redo<Q>(&mut self, task: &Q) -> HashSet<S::Task>
    where
        S::Task: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.in_process = None;
        self.schedule.bidirectional_redo(task)
    }

    pub fn is_done(&self) -> bool {
        self.schedule.is_done()
    }

    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    pub fn into_inner(self) -> S {
        self.schedule
    }
}
