//! Core traits for bolsa abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// JOB & CANDIDATE REPOSITORIES
// =============================================================================

/// Request for creating a job posting.
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub source: String,
    pub label: ProposalLabel,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Request for updating a job posting. Only set fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub label: Option<ProposalLabel>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Repository for job posting CRUD and embedding maintenance.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job posting.
    async fn insert(&self, req: CreateJobRequest) -> Result<Uuid>;

    /// Fetch a job by ID, embedding included.
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Apply a partial update. Fails with `JobNotFound` when absent.
    async fn update(&self, id: Uuid, req: UpdateJobRequest) -> Result<()>;

    /// Delete a job posting. Match rows go with it (FK cascade); proposals
    /// are cancelled separately by the caller before deletion.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Replace the job's embedding vector.
    async fn set_embedding(&self, id: Uuid, embedding: Vector) -> Result<()>;

    /// List jobs with active-proposal counts, optionally including expired
    /// postings.
    async fn list(&self, include_expired: bool) -> Result<Vec<JobSummary>>;
}

/// Repository for candidate profiles.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Fetch a candidate by ID, embedding included.
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>>;

    /// Update résumé URL and profile description after a new upload.
    async fn set_resume(
        &self,
        id: Uuid,
        cv_url: &str,
        description: Option<&str>,
    ) -> Result<()>;

    /// Replace the candidate's embedding vector.
    async fn set_embedding(&self, id: Uuid, embedding: Vector) -> Result<()>;
}

// =============================================================================
// MATCH REPOSITORY
// =============================================================================

/// Repository for match rows and the apply-token transaction.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Delete all matches for the job and insert one fresh pending row per
    /// candidate with an embedding, scored `1 - cosine_distance`. Both
    /// statements run in one transaction. Returns rows inserted.
    async fn regenerate_for_job(&self, job_id: Uuid) -> Result<i64>;

    /// Symmetric regeneration from the candidate side. Returns rows inserted.
    async fn regenerate_for_candidate(&self, candidate_id: Uuid) -> Result<i64>;

    /// Fetch a match by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Match>>;

    /// Pending matches for a job at or above the score threshold, joined
    /// with the data an invitation needs.
    async fn pending_invites(&self, job_id: Uuid, threshold: f32) -> Result<Vec<MatchInvite>>;

    /// Joined invite data for a single match (used by resend).
    async fn invite_details(&self, match_id: Uuid) -> Result<Option<MatchInvite>>;

    /// Persist the apply token for a match. Stored regardless of delivery
    /// outcome so a later resend reuses the same link.
    async fn set_token(&self, match_id: Uuid, token: &str) -> Result<()>;

    /// Mark a match sent (status + sent_at).
    async fn mark_sent(&self, match_id: Uuid) -> Result<()>;

    /// Mark a match resent (status + sent_at); the token is left untouched.
    async fn mark_resent(&self, match_id: Uuid) -> Result<()>;

    /// Consume an apply token: flip the match to applied and create the
    /// corresponding proposal unless one already exists for the pair, all in
    /// one transaction. Fails with `NotFound` when the token does not map to
    /// a match in status `sent` with `applied_at IS NULL`.
    async fn apply(&self, token: &str) -> Result<MatchApplication>;

    /// Admin listing: matches at or above the threshold, newest-sent-first.
    async fn list_admin(&self, threshold: f32) -> Result<Vec<MatchSummary>>;

    /// Top matches for one job by descending score.
    async fn preview_for_job(&self, job_id: Uuid, limit: i64) -> Result<Vec<MatchPreview>>;

    /// Top matches for one candidate by descending score.
    async fn preview_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MatchPreview>>;

    /// Delete matches whose job expired and matches whose job no longer
    /// exists. Returns (expired, orphaned) counts.
    async fn purge_expired(&self) -> Result<(i64, i64)>;
}

// =============================================================================
// PROPOSAL REPOSITORY
// =============================================================================

/// Request for creating a proposal.
#[derive(Debug, Clone)]
pub struct CreateProposalRequest {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub label: ProposalLabel,
}

/// Repository for proposal rows.
#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Conditional insert: creates the proposal only when none exists for
    /// the (job_id, applicant_id) pair. Automatic proposals start in
    /// `waiting`, manual in `pending`. Returns `None` on duplicate.
    async fn create_if_absent(&self, req: CreateProposalRequest) -> Result<Option<Uuid>>;

    /// Fetch a proposal by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Proposal>>;

    /// Joined data needed to notify the employer about this proposal.
    async fn dispatch_details(&self, id: Uuid) -> Result<Option<ProposalDispatch>>;

    /// Mark a proposal sent (status + sent_at).
    async fn mark_sent(&self, id: Uuid) -> Result<()>;

    /// Cancel the active (waiting/pending) proposal for a pair, if any.
    /// Returns the cancelled proposal's ID.
    async fn cancel_active(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Option<Uuid>>;

    /// Cancel all waiting/pending proposals for a job (job deletion).
    /// Returns rows cancelled.
    async fn cancel_for_job(&self, job_id: Uuid) -> Result<i64>;

    /// Admin listing joined with job and applicant data, newest first.
    async fn list_admin(&self) -> Result<Vec<ProposalSummary>>;
}

// =============================================================================
// PROPOSAL TEMPLATE REPOSITORY
// =============================================================================

/// Request for creating a proposal template.
#[derive(Debug, Clone)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub kind: ProposalLabel,
    pub subject: String,
    pub body: String,
}

/// Request for updating a proposal template. Only set fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub kind: Option<ProposalLabel>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Repository for proposal templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a new template (never default on creation).
    async fn create(&self, req: CreateTemplateRequest) -> Result<Uuid>;

    /// Fetch a template by ID.
    async fn get(&self, id: Uuid) -> Result<Option<ProposalTemplate>>;

    /// The default template for a kind, if one is set.
    async fn default_for(&self, kind: ProposalLabel) -> Result<Option<ProposalTemplate>>;

    /// List all templates, most recently updated first.
    async fn list(&self) -> Result<Vec<ProposalTemplate>>;

    /// Apply a partial update. Fails with `NotFound` when absent.
    async fn update(&self, id: Uuid, req: UpdateTemplateRequest) -> Result<()>;

    /// Delete a template. Fails with `NotFound` when absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Mark the template as default for its kind, clearing the previous
    /// default for that kind in the same transaction.
    async fn set_default(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// EMBEDDING BACKEND
// =============================================================================

/// Backend that turns text into a fixed-length embedding vector.
///
/// Consumed as a pure function `text → vector`; the concrete implementations
/// live in bolsa-inference.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Model identifier, recorded for observability.
    fn model_name(&self) -> String;
}

// =============================================================================
// TASK REPOSITORY
// =============================================================================

/// Repository for the background task queue.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Enqueue a task to run at or after `run_after`.
    async fn enqueue(
        &self,
        task_type: TaskType,
        payload: Option<JsonValue>,
        run_after: DateTime<Utc>,
        max_retries: i32,
    ) -> Result<Uuid>;

    /// Claim the next due pending task for the given types, marking it
    /// running. Uses row locking so concurrent workers never claim the same
    /// task. An empty slice claims any type.
    async fn claim_due(&self, task_types: &[TaskType]) -> Result<Option<Task>>;

    /// Mark a task completed.
    async fn complete(&self, task_id: Uuid) -> Result<()>;

    /// Record a failure: re-queue while retries remain, otherwise mark the
    /// task failed with the error message.
    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()>;

    /// Fetch a task by ID.
    async fn get(&self, task_id: Uuid) -> Result<Option<Task>>;

    /// Number of pending tasks.
    async fn pending_count(&self) -> Result<i64>;
}
