//! Scheduler - destination ごとに 1 タスクを起動する

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::destination_task::DestinationTask;
use super::shutdown::ShutdownSignal;
use crate::domain::TaskPhase;

/// Destination task group handle.
/// - `request_shutdown()` でタスク全体に停止を通知する
/// - `join()` で全タスクの終了を待てる
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<ScheduledTask>,
}

struct ScheduledTask {
    name: String,
    phase: watch::Receiver<TaskPhase>,
    join: JoinHandle<TaskPhase>,
}

impl Scheduler {
    /// Spawns every task at once. Must be called inside a tokio runtime.
    pub fn spawn(tasks: Vec<DestinationTask>) -> Self {
        let (shutdown_tx, shutdown) = ShutdownSignal::channel();

        let tasks = tasks
            .into_iter()
            .map(|task| {
                let name = task.name().to_string();
                let phase = task.subscribe();
                let join = tokio::spawn(task.run(shutdown.clone()));
                ScheduledTask { name, phase, join }
            })
            .collect::<Vec<_>>();
        info!(destinations = tasks.len(), "Scheduler started");

        Self { shutdown_tx, tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Current phase of every destination, in spawn order.
    pub fn phases(&self) -> Vec<(String, TaskPhase)> {
        self.tasks
            .iter()
            .map(|t| (t.name.clone(), *t.phase.borrow()))
            .collect()
    }

    /// Resolves once every task has ended on its own, e.g. after all of them
    /// were aborted by rejected credentials.
    pub async fn wait_all_finished(&self) {
        for task in &self.tasks {
            let mut phase = task.phase.clone();
            // a closed channel means the task is gone
            let _ = phase.wait_for(|p| p.is_terminal()).await;
        }
    }

    /// Asks every task to stop. In-flight remote calls are not cancelled;
    /// tasks stop at their next wait.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for every task to end on its own and returns the terminal phases.
    pub async fn join(self) -> Vec<(String, TaskPhase)> {
        let mut finished = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            let phase = match task.join.await {
                Ok(phase) => phase,
                Err(e) => {
                    warn!(subreddit = %task.name, error = %e, "Destination task panicked");
                    TaskPhase::Aborted
                }
            };
            finished.push((task.name, phase));
        }
        // keeps the channel open until every task has returned
        drop(self.shutdown_tx);
        finished
    }

    /// Shutdown and wait for all tasks.
    pub async fn shutdown_and_join(self) -> Vec<(String, TaskPhase)> {
        self.request_shutdown();
        self.join().await
    }
}
