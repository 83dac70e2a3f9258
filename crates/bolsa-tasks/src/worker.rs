//! Task worker: claims due tasks and runs them through registered handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use bolsa_core::{defaults, Result, Task, TaskRepository, TaskType, WorkerSettings};
use bolsa_db::Database;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| bolsa_core::Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }
}

/// Task worker that processes due tasks from the queue.
pub struct TaskWorker {
    db: Database,
    settings: WorkerSettings,
    handlers: Arc<RwLock<HashMap<TaskType, Arc<dyn TaskHandler>>>>,
}

impl TaskWorker {
    /// Create a new task worker.
    pub fn new(db: Database, settings: WorkerSettings) -> Self {
        Self {
            db,
            settings,
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a handler for a task type.
    pub async fn register_handler<H: TaskHandler + 'static>(&self, handler: H) {
        let task_type = handler.task_type();
        let mut handlers = self.handlers.write().await;
        handlers.insert(task_type, Arc::new(handler));
        debug!(?task_type, "Registered task handler");
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let worker = Arc::new(self);
        tokio::spawn(async move {
            worker.run(&mut shutdown_rx).await;
        });

        WorkerHandle { shutdown_tx }
    }

    /// Run the worker loop with concurrent task processing.
    ///
    /// Claims up to `max_concurrent` due tasks at a time. When the queue is
    /// drained it sleeps for the poll interval, but an enqueue through the
    /// shared notify handle wakes it early. Delayed tasks become claimable
    /// only once their `run_after` deadline passes, so the poll interval
    /// bounds how late a just-due task can start.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.settings.enabled {
            info!("Task worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.settings.poll_interval_ms,
            max_concurrent = self.settings.max_concurrent,
            "Task worker started"
        );

        let poll_interval = Duration::from_millis(self.settings.poll_interval_ms);
        let notify = self.db.tasks.task_notify();

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Task worker received shutdown signal");
                break;
            }

            let mut claimed = 0;
            let mut tasks = tokio::task::JoinSet::new();

            for _ in 0..self.settings.max_concurrent {
                match self.claim_task().await {
                    Some(task) => {
                        claimed += 1;
                        let runner = TaskRunner {
                            db: self.db.clone(),
                            handlers: self.handlers.clone(),
                        };
                        tasks.spawn(async move {
                            runner.execute_task(task).await;
                        });
                    }
                    None => break,
                }
            }

            if claimed == 0 {
                // Queue empty or nothing due yet: sleep until the poll
                // interval elapses or an enqueue wakes us.
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Task worker received shutdown signal");
                        break;
                    }
                    _ = sleep(poll_interval) => {}
                    _ = notify.notified() => {}
                }
            } else {
                debug!(claimed, "Processing concurrent task batch");
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        error!(error = ?e, "Task panicked");
                    }
                }
                // No sleep; immediately try to claim more tasks
            }
        }

        info!("Task worker stopped");
    }

    /// Claim the next due task without processing it.
    async fn claim_task(&self) -> Option<Task> {
        let task_types: Vec<TaskType> = {
            let handlers = self.handlers.read().await;
            handlers.keys().copied().collect()
        };

        match self.db.tasks.claim_due(&task_types).await {
            Ok(Some(task)) => Some(task),
            Ok(None) => None,
            Err(e) => {
                error!(error = ?e, "Failed to claim task");
                None
            }
        }
    }
}

/// Reference bundle for executing a single task in a spawned job.
struct TaskRunner {
    db: Database,
    handlers: Arc<RwLock<HashMap<TaskType, Arc<dyn TaskHandler>>>>,
}

impl TaskRunner {
    /// Execute a single claimed task. Handler panics and timeouts become
    /// task failures; they never take the worker loop down.
    async fn execute_task(self, task: Task) {
        let start = Instant::now();
        let task_id = task.id;
        let task_type = task.task_type;

        info!(%task_id, ?task_type, "Processing task");

        let handler = {
            let handlers = self.handlers.read().await;
            handlers.get(&task_type).cloned()
        };

        let result = match handler {
            Some(handler) => {
                let ctx = TaskContext::new(task);
                let timeout = Duration::from_secs(defaults::TASK_TIMEOUT_SECS);
                match tokio::time::timeout(timeout, handler.execute(ctx)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            %task_id,
                            ?task_type,
                            "Task exceeded timeout of {}s",
                            defaults::TASK_TIMEOUT_SECS
                        );
                        TaskResult::Failed(format!(
                            "Task exceeded timeout of {}s",
                            defaults::TASK_TIMEOUT_SECS
                        ))
                    }
                }
            }
            None => {
                warn!(?task_type, "No handler registered for task type");
                TaskResult::Failed(format!("No handler for task type: {}", task_type))
            }
        };

        match result {
            TaskResult::Success => {
                if let Err(e) = self.db.tasks.complete(task_id).await {
                    error!(error = ?e, %task_id, "Failed to mark task as completed");
                } else {
                    info!(
                        %task_id,
                        ?task_type,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Task completed"
                    );
                }
            }
            TaskResult::Failed(error) => {
                if let Err(e) = self.db.tasks.fail(task_id, &error).await {
                    error!(error = ?e, %task_id, "Failed to mark task as failed");
                } else {
                    warn!(
                        %task_id,
                        ?task_type,
                        %error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Task failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoOpHandler;

    #[async_trait]
    impl TaskHandler for NoOpHandler {
        fn task_type(&self) -> TaskType {
            TaskType::PurgeExpiredMatches
        }

        async fn execute(&self, _ctx: TaskContext) -> TaskResult {
            TaskResult::Success
        }
    }

    #[test]
    fn test_noop_handler_type() {
        let handler = NoOpHandler;
        assert_eq!(handler.task_type(), TaskType::PurgeExpiredMatches);
    }

    #[test]
    fn test_task_result_debug() {
        let result = TaskResult::Failed("boom".to_string());
        assert!(format!("{:?}", result).contains("boom"));
    }
}
