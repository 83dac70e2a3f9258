//! Match regeneration handlers.
//!
//! Job creation and résumé updates enqueue these instead of running the
//! pipeline inside the request: the work is decoupled from any particular
//! request-handling runtime and survives process restarts.

use std::sync::Arc;

use async_trait::async_trait;

use bolsa_core::{CandidateTaskPayload, JobTaskPayload, TaskType};
use bolsa_match::MatchEngine;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Regenerates matches for a job and sends invitations.
pub struct RegenerateJobMatchesHandler {
    engine: Arc<MatchEngine>,
}

impl RegenerateJobMatchesHandler {
    /// Create a new handler backed by the match engine.
    pub fn new(engine: Arc<MatchEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TaskHandler for RegenerateJobMatchesHandler {
    fn task_type(&self) -> TaskType {
        TaskType::RegenerateJobMatches
    }

    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let payload: JobTaskPayload = match ctx.payload() {
            Ok(p) => p,
            Err(e) => return TaskResult::Failed(e.to_string()),
        };

        match self.engine.regenerate_for_job(payload.job_id).await {
            Ok(_) => TaskResult::Success,
            Err(e) => TaskResult::Failed(e.to_string()),
        }
    }
}

/// Regenerates matches for a candidate (no invitations).
pub struct RegenerateCandidateMatchesHandler {
    engine: Arc<MatchEngine>,
}

impl RegenerateCandidateMatchesHandler {
    /// Create a new handler backed by the match engine.
    pub fn new(engine: Arc<MatchEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TaskHandler for RegenerateCandidateMatchesHandler {
    fn task_type(&self) -> TaskType {
        TaskType::RegenerateCandidateMatches
    }

    async fn execute(&self, ctx: TaskContext) -> TaskResult {
        let payload: CandidateTaskPayload = match ctx.payload() {
            Ok(p) => p,
            Err(e) => return TaskResult::Failed(e.to_string()),
        };

        match self
            .engine
            .regenerate_for_candidate(payload.candidate_id)
            .await
        {
            Ok(_) => TaskResult::Success,
            Err(e) => TaskResult::Failed(e.to_string()),
        }
    }
}
