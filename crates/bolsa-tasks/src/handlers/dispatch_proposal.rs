//! Delayed proposal dispatch handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use bolsa_core::{ProposalStatus, ProposalTaskPayload, TaskType};
use bolsa_match::{DispatchOutcome, ProposalScheduler};

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Fires after the proposal-send delay and notifies the employer, unless
/// the proposal already left `waiting`; then the send was superseded and
/// the task is a no-op.
pub struct DispatchProposalHandler {
    scheduler: Arc<ProposalScheduler>,
}

impl DispatchProposalHandler {
    /// Create a new handler backed by the proposal scheduler.
    pub fn new(scheduler: Arc<ProposalScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl TaskHandler for DispatchProposalHandler {
    fn task_type(&self) -> TaskType {
        TaskType::DispatchProposal
    }

    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let payload: ProposalTaskPayload = match ctx.payload() {
            Ok(p) => p,
            Err(e) => return TaskResult::Failed(e.to_string()),
        };

        match self
            .scheduler
            .dispatch(payload.proposal_id, ProposalStatus::Waiting)
            .await
        {
            Ok(DispatchOutcome::Sent) => TaskResult::Success,
            Ok(DispatchOutcome::Superseded) => {
                info!(
                    proposal_id = %payload.proposal_id,
                    "Dispatch superseded by earlier status change"
                );
                TaskResult::Success
            }
            // The task has no retry budget; the proposal stays in `waiting`
            // for manual reconciliation.
            Err(e) => TaskResult::Failed(e.to_string()),
        }
    }
}
