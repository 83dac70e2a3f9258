//! Tunable defaults for the bolsa backend.
//!
//! Values here are compile-time constants. Anything an operator can
//! override at runtime lives in [`crate::config::AppConfig`]; constants
//! without a config counterpart are deliberate fixed points of the design.

/// Minimum similarity score for a match to trigger an automatic invitation.
///
/// Fixed by design for now; inclusion uses `>=`.
pub const MATCH_SCORE_THRESHOLD: f32 = 0.80;

/// Maximum rows returned by the admin match preview endpoints.
pub const MATCH_PREVIEW_LIMIT: i64 = 100;

/// Delay before an automatic proposal is dispatched to the employer.
///
/// The window in which a candidate can still cancel; any status change
/// before the deadline silently supersedes the scheduled send.
pub const PROPOSAL_SEND_DELAY_SECS: u64 = 300;

/// Worker polling interval when the task queue is empty.
pub const TASK_POLL_INTERVAL_MS: u64 = 500;

/// Maximum tasks a worker claims and runs concurrently.
pub const TASK_MAX_CONCURRENT: usize = 4;

/// Default retry budget for regeneration and purge tasks. Proposal
/// dispatch is enqueued with zero retries: a failed send is left in
/// `waiting` for manual reconciliation.
pub const TASK_MAX_RETRIES: i32 = 3;

/// Hard ceiling on a single task execution before it is failed.
pub const TASK_TIMEOUT_SECS: u64 = 300;

/// Interval between expired-match purge runs.
pub const PURGE_INTERVAL_SECS: u64 = 3600;

/// Dimension of the embedding vectors stored in PostgreSQL.
pub const EMBEDDING_DIMENSION: i32 = 1536;

/// Default embedding model requested from the backend.
pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Front-end base URL used for apply links when none is configured.
pub const FRONTEND_BASE_URL: &str = "https://bolsa.example.org";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_in_unit_interval() {
        assert!(MATCH_SCORE_THRESHOLD > 0.0 && MATCH_SCORE_THRESHOLD < 1.0);
    }

    #[test]
    fn test_proposal_delay_is_five_minutes() {
        assert_eq!(PROPOSAL_SEND_DELAY_SECS, 300);
    }
}
