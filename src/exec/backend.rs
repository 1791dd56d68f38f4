// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The coordinator talks to an `ExecutorBackend` instead of running tasks
//! itself. Tests swap in a fake that completes tasks immediately; the CLI
//! uses [`SimulatedExecutorBackend`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::SchedulerEvent;
use crate::errors::Result;
use crate::types::TaskName;

/// Trait abstracting how dispatched tasks are executed.
///
/// Implementations report back by sending [`SchedulerEvent::TaskCompleted`]
/// (or a redo request) on the coordinator's channel.
pub trait ExecutorBackend: Send {
    /// Start executing the given tasks.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor that "performs" each task by sleeping for a random duration.
///
/// Every dispatched task runs in its own Tokio task, so tasks dispatched
/// together genuinely overlap and complete in a nondeterministic order.
pub struct SimulatedExecutorBackend {
    runtime_tx: mpsc::Sender<SchedulerEvent>,
    max_task_millis: u64,
}

impl SimulatedExecutorBackend {
    pub fn new(runtime_tx: mpsc::Sender<SchedulerEvent>, max_task_millis: u64) -> Self {
        Self {
            runtime_tx,
            max_task_millis,
        }
    }
}

impl ExecutorBackend for SimulatedExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<TaskName>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Durations are drawn up front: the thread-local rng is not `Send`.
        let mut rng = rand::rng();
        let jobs: Vec<(TaskName, Duration)> = tasks
            .into_iter()
            .map(|task| {
                let millis = rng.random_range(0..=self.max_task_millis);
                (task, Duration::from_millis(millis))
            })
            .collect();
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            for (task, delay) in jobs {
                let tx = tx.clone();
                debug!(task = %task, ?delay, "starting simulated task");

                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    info!(task = %task, "completed");
                    if tx
                        .send(SchedulerEvent::TaskCompleted { task: task.clone() })
                        .await
                        .is_err()
                    {
                        warn!(task = %task, "coordinator gone; dropping completion");
                    }
                });
            }
            Ok(())
        })
    }
}
