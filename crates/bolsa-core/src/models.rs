//! Core data models for the bolsa recruiting backend.
//!
//! These types are shared across all bolsa crates and represent the core
//! domain entities: job postings, candidates, matches, proposals, proposal
//! templates, and background tasks.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// JOB & CANDIDATE TYPES
// =============================================================================

/// A job posting. Carries the embedding used for candidate matching, so it
/// is not serialized directly; API responses use [`JobSummary`].
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    /// Expired jobs (expires_at < now) are excluded from new matching and
    /// periodically purged along with their matches.
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub embedding: Option<Vector>,
    pub source: String,
    /// Inherited by proposals created through the apply flow.
    pub label: ProposalLabel,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serializable job view for API responses (no embedding vector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Uuid,
    pub source: String,
    pub label: ProposalLabel,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// Active (non-cancelled) proposals for this job.
    pub candidates_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A candidate profile built from an uploaded résumé.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: String,
    pub description: Option<String>,
    pub cv_url: Option<String>,
    pub embedding: Option<Vector>,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// MATCH TYPES
// =============================================================================

/// Lifecycle of a job ↔ candidate match.
///
/// pending → sent (token issued, invitation attempted) → resent (idempotent
/// re-send, token reused) → applied (terminal, exactly once).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Sent,
    Resent,
    Applied,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Resent => write!(f, "resent"),
            Self::Applied => write!(f, "applied"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "resent" => Ok(Self::Resent),
            "applied" => Ok(Self::Applied),
            _ => Err(format!("Invalid match status: {}", s)),
        }
    }
}

/// A scored job ↔ candidate pairing.
///
/// At most one non-deleted match exists per (job_id, candidate_id); matches
/// are regenerated wholesale whenever either side's embedding changes.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    /// Cosine similarity transformed as `1 - distance`, in [0, 1].
    pub score: f32,
    pub status: MatchStatus,
    /// Single-use opaque credential; persisted once issued so resends keep
    /// previously distributed links working.
    pub apply_token: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Joined row with everything needed to send or resend an invitation.
#[derive(Debug, Clone)]
pub struct MatchInvite {
    pub match_id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub score: f32,
    pub status: MatchStatus,
    pub apply_token: Option<String>,
    pub job_title: String,
    pub job_contact_email: Option<String>,
    pub job_contact_phone: Option<String>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_cv_url: Option<String>,
}

/// Outcome of consuming an apply token.
#[derive(Debug, Clone, Copy)]
pub struct MatchApplication {
    pub match_id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    /// `None` when a proposal for this (job, applicant) pair already existed.
    pub proposal_id: Option<Uuid>,
}

/// Admin listing row for the matchings panel.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub id: Uuid,
    pub score: f32,
    pub status: MatchStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_id: Uuid,
    pub candidate_email: String,
}

/// Preview row: one scored pairing for a given job or candidate.
#[derive(Debug, Clone, Serialize)]
pub struct MatchPreview {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub score: f32,
    pub job_title: String,
    pub candidate_name: String,
}

// =============================================================================
// PROPOSAL TYPES
// =============================================================================

/// Proposal label, inherited from the originating job posting. Doubles as
/// the proposal-template kind: `automatic` templates drive match
/// invitations, `manual` templates drive employer notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalLabel {
    Automatic,
    #[default]
    Manual,
}

impl std::fmt::Display for ProposalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for ProposalLabel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Invalid proposal label: {}", s)),
        }
    }
}

/// Proposal lifecycle.
///
/// Automatic proposals start in `waiting` and leave it only through the
/// delayed dispatcher or an external cancellation; manual proposals start
/// in `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Waiting,
    Pending,
    Sent,
    Cancelled,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }
}

/// A tracked application of a candidate to a job posting.
#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub label: ProposalLabel,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Admin listing row joined with job and applicant data.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalSummary {
    pub id: Uuid,
    pub label: ProposalLabel,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub job_id: Uuid,
    pub job_title: String,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
}

/// Joined data needed to notify the employer about a proposal.
#[derive(Debug, Clone)]
pub struct ProposalDispatch {
    pub proposal: Proposal,
    pub job_title: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_cv_url: Option<String>,
    pub employer_name: String,
    pub employer_email: String,
    pub employer_phone: Option<String>,
}

// =============================================================================
// PROPOSAL TEMPLATE TYPES
// =============================================================================

/// A stored subject/body template with `{{placeholder}}` tokens.
///
/// At most one `is_default = true` row exists per kind; setting a new
/// default atomically clears the previous one for that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalTemplate {
    pub id: Uuid,
    pub name: String,
    pub kind: ProposalLabel,
    pub subject: String,
    pub body: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// TASK QUEUE TYPES
// =============================================================================

/// Background task types processed by the bolsa-tasks worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RegenerateJobMatches,
    RegenerateCandidateMatches,
    DispatchProposal,
    PurgeExpiredMatches,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegenerateJobMatches => write!(f, "regenerate_job_matches"),
            Self::RegenerateCandidateMatches => write!(f, "regenerate_candidate_matches"),
            Self::DispatchProposal => write!(f, "dispatch_proposal"),
            Self::PurgeExpiredMatches => write!(f, "purge_expired_matches"),
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "regenerate_job_matches" => Ok(Self::RegenerateJobMatches),
            "regenerate_candidate_matches" => Ok(Self::RegenerateCandidateMatches),
            "dispatch_proposal" => Ok(Self::DispatchProposal),
            "purge_expired_matches" => Ok(Self::PurgeExpiredMatches),
            _ => Err(format!("Invalid task type: {}", s)),
        }
    }
}

/// Task execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// A queued background task. `run_after` defers execution; the worker only
/// claims tasks whose deadline has passed.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub payload: Option<JsonValue>,
    pub run_after: DateTime<Utc>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload for [`TaskType::RegenerateJobMatches`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobTaskPayload {
    pub job_id: Uuid,
}

/// Payload for [`TaskType::RegenerateCandidateMatches`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateTaskPayload {
    pub candidate_id: Uuid,
}

/// Payload for [`TaskType::DispatchProposal`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProposalTaskPayload {
    pub proposal_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_match_status_display() {
        assert_eq!(MatchStatus::Pending.to_string(), "pending");
        assert_eq!(MatchStatus::Sent.to_string(), "sent");
        assert_eq!(MatchStatus::Resent.to_string(), "resent");
        assert_eq!(MatchStatus::Applied.to_string(), "applied");
    }

    #[test]
    fn test_match_status_round_trip() {
        for status in [
            MatchStatus::Pending,
            MatchStatus::Sent,
            MatchStatus::Resent,
            MatchStatus::Applied,
        ] {
            let recovered = MatchStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, recovered);
        }
    }

    #[test]
    fn test_match_status_invalid() {
        assert!(MatchStatus::from_str("unknown").is_err());
        assert!(MatchStatus::from_str("SENT").is_err());
    }

    #[test]
    fn test_proposal_label_default_is_manual() {
        assert_eq!(ProposalLabel::default(), ProposalLabel::Manual);
    }

    #[test]
    fn test_proposal_label_round_trip() {
        for label in [ProposalLabel::Automatic, ProposalLabel::Manual] {
            assert_eq!(ProposalLabel::from_str(&label.to_string()).unwrap(), label);
        }
    }

    #[test]
    fn test_proposal_status_round_trip() {
        for status in [
            ProposalStatus::Waiting,
            ProposalStatus::Pending,
            ProposalStatus::Sent,
            ProposalStatus::Cancelled,
        ] {
            let recovered = ProposalStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, recovered);
        }
    }

    #[test]
    fn test_task_type_round_trip() {
        for task_type in [
            TaskType::RegenerateJobMatches,
            TaskType::RegenerateCandidateMatches,
            TaskType::DispatchProposal,
            TaskType::PurgeExpiredMatches,
        ] {
            let recovered = TaskType::from_str(&task_type.to_string()).unwrap();
            assert_eq!(task_type, recovered);
        }
    }

    #[test]
    fn test_task_type_strings_are_unique() {
        let strings: Vec<String> = [
            TaskType::RegenerateJobMatches,
            TaskType::RegenerateCandidateMatches,
            TaskType::DispatchProposal,
            TaskType::PurgeExpiredMatches,
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();
        let mut unique = strings.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(strings.len(), unique.len());
    }

    #[test]
    fn test_task_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            let recovered = TaskStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(status, recovered);
        }
    }

    #[test]
    fn test_proposal_label_serde_lowercase() {
        let json = serde_json::to_string(&ProposalLabel::Automatic).unwrap();
        assert_eq!(json, "\"automatic\"");
        let parsed: ProposalLabel = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(parsed, ProposalLabel::Manual);
    }

    #[test]
    fn test_task_payload_serde() {
        let payload = ProposalTaskPayload {
            proposal_id: Uuid::nil(),
        };
        let value = serde_json::to_value(payload).unwrap();
        let back: ProposalTaskPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back.proposal_id, Uuid::nil());
    }
}
