//! Task handler trait and execution context.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use bolsa_core::{Error, Result, Task, TaskType};

/// Context provided to task handlers.
pub struct TaskContext {
    /// The task being processed.
    pub task: Task,
}

impl TaskContext {
    /// Create a new task context.
    pub fn new(task: Task) -> Self {
        Self { task }
    }

    /// Decode the task payload into its typed form.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self
            .task
            .payload
            .clone()
            .ok_or_else(|| Error::Task("task has no payload".to_string()))?;
        serde_json::from_value(value).map_err(Error::from)
    }
}

/// Result of task execution.
#[derive(Debug)]
pub enum TaskResult {
    /// Task completed successfully.
    Success,
    /// Task failed with an error message.
    Failed(String),
}

/// Trait for task handlers.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task type this handler processes.
    fn task_type(&self) -> TaskType;

    /// Execute the task.
    async fn execute(&self, ctx: TaskContext) -> TaskResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolsa_core::{ProposalTaskPayload, TaskStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn task_with_payload(payload: Option<serde_json::Value>) -> Task {
        Task {
            id: Uuid::new_v4(),
            task_type: TaskType::DispatchProposal,
            status: TaskStatus::Running,
            payload,
            run_after: Utc::now(),
            error_message: None,
            retry_count: 0,
            max_retries: 0,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_payload_decodes_typed() {
        let proposal_id = Uuid::new_v4();
        let payload = serde_json::to_value(ProposalTaskPayload { proposal_id }).unwrap();
        let ctx = TaskContext::new(task_with_payload(Some(payload)));

        let decoded: ProposalTaskPayload = ctx.payload().unwrap();
        assert_eq!(decoded.proposal_id, proposal_id);
    }

    #[test]
    fn test_payload_missing_is_error() {
        let ctx = TaskContext::new(task_with_payload(None));
        let result: Result<ProposalTaskPayload> = ctx.payload();
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_wrong_shape_is_error() {
        let ctx = TaskContext::new(task_with_payload(Some(serde_json::json!({"foo": 1}))));
        let result: Result<ProposalTaskPayload> = ctx.payload();
        assert!(result.is_err());
    }
}
