//! # bolsa-match
//!
//! The matching-and-proposal pipeline: turning a new résumé or job posting
//! into similarity-ranked matches, sending templated invitations exactly
//! once, converting a recipient's click into a tracked idempotent
//! application, and dispatching delayed employer notifications that any
//! earlier status change supersedes.
//!
//! The engine owns policy (thresholds, template contexts, failure
//! handling); persistence and scoring SQL live in bolsa-db, delivery in
//! bolsa-notify.

pub mod dispatch;
pub mod engine;

pub use dispatch::{
    builtin_employer_notification, default_send_delay, employer_context, CreateOutcome,
    DispatchOutcome, ProposalScheduler,
};
pub use engine::{
    builtin_invitation, invite_context, resend_message, MatchEngine, MatchEngineConfig,
    RegenerationReport,
};
