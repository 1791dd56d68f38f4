// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::types::TaskName;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RunReport, SchedulerEvent};

/// Drives the core in response to `SchedulerEvent`s and delegates task
/// execution to an `ExecutorBackend`.
///
/// This is the single owner of the graph while tasks run concurrently:
/// every completion and redo is applied here, one event at a time.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<SchedulerEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<SchedulerEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initially available tasks.
    /// - Feeds each received event into the core.
    /// - Executes the commands it returns, until the core says stop or the
    ///   channel closes.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("coordinator started");

        let step = self.core.start();
        let mut keep_running = self.execute_step(step).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                info!("event channel closed; exiting");
                break;
            };

            debug!(?event, "coordinator received event");
            let step = self.core.step(event);
            keep_running = self.execute_step(step).await?;
        }

        info!(
            completed = self.core.completion_order().len(),
            "coordinator exiting"
        );
        Ok(self.core.into_report())
    }

    async fn execute_step(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
                CoreCommand::RequestExit => {
                    debug!("core issued RequestExit command");
                }
            }
        }

        if !step.keep_running {
            info!("core requested exit; stopping coordinator");
        }
        Ok(step.keep_running)
    }

    async fn spawn_ready(&mut self, tasks: Vec<TaskName>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        debug!(?tasks, "dispatching ready tasks");
        self.executor.spawn_ready_tasks(tasks).await
    }
}
