use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use taskdag::engine::{RedoMode, SchedulerEvent};
use taskdag::errors::Result;
use taskdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports `TaskCompleted` for each dispatched task
/// - optionally follows one task's completion with a redo request
/// - optionally follows one task's completion with a shutdown request.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<SchedulerEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    redo_after: HashMap<String, (String, RedoMode)>,
    shutdown_after: Option<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<SchedulerEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            redo_after: HashMap::new(),
            shutdown_after: None,
        }
    }

    /// The first time `trigger` completes, also request a redo of `task`.
    pub fn redo_after(mut self, trigger: &str, task: &str, mode: RedoMode) -> Self {
        self.redo_after
            .insert(trigger.to_string(), (task.to_string(), mode));
        self
    }

    /// The first time `trigger` completes, also request a shutdown, as
    /// Ctrl-C would.
    pub fn shutdown_after(mut self, trigger: &str) -> Self {
        self.shutdown_after = Some(trigger.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let mut events = Vec::new();
        for t in tasks {
            self.executed.lock().unwrap().push(t.clone());
            let redo = self.redo_after.remove(&t);
            let shutdown = self.shutdown_after.as_deref() == Some(t.as_str());
            events.push(SchedulerEvent::TaskCompleted { task: t });
            if let Some((task, mode)) = redo {
                events.push(SchedulerEvent::RedoRequested { task, mode });
            }
            if shutdown {
                self.shutdown_after = None;
                events.push(SchedulerEvent::ShutdownRequested);
            }
        }

        let tx = self.runtime_tx.clone();
        Box::pin(async move {
            for event in events {
                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
