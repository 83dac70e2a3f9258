//! Expired-match purge handler.

use async_trait::async_trait;
use tracing::info;

use bolsa_core::{MatchRepository, TaskType};
use bolsa_db::Database;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Deletes matches whose job expired and matches whose job no longer
/// exists.
pub struct PurgeExpiredMatchesHandler {
    db: Database,
}

impl PurgeExpiredMatchesHandler {
    /// Create a new purge handler.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskHandler for PurgeExpiredMatchesHandler {
    fn task_type(&self) -> TaskType {
        TaskType::PurgeExpiredMatches
    }

    async fn execute(&self, _ctx: TaskContext) -> TaskResult {
        match self.db.matches.purge_expired().await {
            Ok((expired, orphaned)) => {
                info!(expired, orphaned, "Purged stale matches");
                TaskResult::Success
            }
            Err(e) => TaskResult::Failed(e.to_string()),
        }
    }
}
