//! # bolsa-tasks
//!
//! Background task queue worker for the bolsa recruiting backend.
//!
//! This crate provides:
//! - The worker loop that claims due tasks (`FOR UPDATE SKIP LOCKED`
//!   underneath) and runs them through registered handlers
//! - Handlers for match regeneration, delayed proposal dispatch, and
//!   expired-match purging
//!
//! The queue carries `run_after` deadlines, which is how the five-minute
//! proposal window is implemented without tying the delay to any request
//! lifecycle.

pub mod handler;
pub mod handlers;
pub mod worker;

use std::time::Duration;

use chrono::Utc;
use tracing::error;

use bolsa_core::{defaults, TaskRepository, TaskType};
use bolsa_db::Database;

pub use handler::{TaskContext, TaskHandler, TaskResult};
pub use handlers::{
    DispatchProposalHandler, PurgeExpiredMatchesHandler, RegenerateCandidateMatchesHandler,
    RegenerateJobMatchesHandler,
};
pub use worker::{TaskWorker, WorkerHandle};

/// Spawn a loop that enqueues an expired-match purge on a fixed interval.
pub fn spawn_periodic_purge(db: Database, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup is quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = db
                .tasks
                .enqueue(
                    TaskType::PurgeExpiredMatches,
                    None,
                    Utc::now(),
                    defaults::TASK_MAX_RETRIES,
                )
                .await
            {
                error!(error = %e, "Failed to enqueue purge task");
            }
        }
    });
}
