//! Task queue repository implementation.
//!
//! Backs the bolsa-tasks worker: tasks carry a `run_after` deadline, so the
//! same queue serves both immediate work (match regeneration) and delayed
//! work (the five-minute proposal-dispatch window).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tokio::sync::Notify;
use uuid::Uuid;

use bolsa_core::{new_v7, Error, Result, Task, TaskRepository, TaskStatus, TaskType};

/// PostgreSQL implementation of TaskRepository.
pub struct PgTaskRepository {
    pool: Pool<Postgres>,
    /// Notify handle for event-driven worker wake.
    notify: Arc<Notify>,
}

impl PgTaskRepository {
    /// Create a new PgTaskRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Create a new PgTaskRepository sharing an existing notify handle.
    pub fn with_notify(pool: Pool<Postgres>, notify: Arc<Notify>) -> Self {
        Self { pool, notify }
    }

    /// Get the task notification handle for event-driven waking.
    pub fn task_notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    fn parse_task_type(s: &str) -> TaskType {
        s.parse().unwrap_or(TaskType::PurgeExpiredMatches) // fallback
    }

    fn parse_task_status(s: &str) -> TaskStatus {
        s.parse().unwrap_or(TaskStatus::Pending) // fallback
    }

    fn parse_task_row(row: sqlx::postgres::PgRow) -> Task {
        Task {
            id: row.get("id"),
            task_type: Self::parse_task_type(row.get("task_type")),
            status: Self::parse_task_status(row.get("status")),
            payload: row.get("payload"),
            run_after: row.get("run_after"),
            error_message: row.get("error_message"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

const TASK_COLUMNS: &str = "id, task_type::text AS task_type, status::text AS status, payload,
     run_after, error_message, retry_count, max_retries,
     created_at, started_at, completed_at";

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn enqueue(
        &self,
        task_type: TaskType,
        payload: Option<JsonValue>,
        run_after: DateTime<Utc>,
        max_retries: i32,
    ) -> Result<Uuid> {
        let task_id = new_v7();

        sqlx::query(
            "INSERT INTO task_queue (id, task_type, status, payload, run_after, max_retries, created_at)
             VALUES ($1, $2::task_type, 'pending'::task_status, $3, $4, $5, $6)",
        )
        .bind(task_id)
        .bind(task_type.to_string())
        .bind(&payload)
        .bind(run_after)
        .bind(max_retries)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.notify.notify_waiters();
        Ok(task_id)
    }

    async fn claim_due(&self, task_types: &[TaskType]) -> Result<Option<Task>> {
        let now = Utc::now();
        let type_strings: Vec<String> = task_types.iter().map(|t| t.to_string()).collect();

        // FOR UPDATE SKIP LOCKED so concurrent workers never claim the same
        // row. Only due tasks (run_after <= now) are eligible; the deadline
        // ordering drains overdue work oldest-first.
        let query = format!(
            "UPDATE task_queue
             SET status = 'running'::task_status, started_at = $1
             WHERE id = (
                 SELECT id FROM task_queue
                 WHERE status = 'pending'::task_status
                   AND run_after <= $1
                   AND (cardinality($2::text[]) = 0 OR task_type::text = ANY($2))
                 ORDER BY run_after ASC, created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {TASK_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(now)
            .bind(&type_strings)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_task_row))
    }

    async fn complete(&self, task_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE task_queue
             SET status = 'completed'::task_status, completed_at = $1
             WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(task_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (retry_count, max_retries): (i32, i32) =
            sqlx::query_as("SELECT retry_count, max_retries FROM task_queue WHERE id = $1")
                .bind(task_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if retry_count < max_retries {
            // Retry: reset to pending with incremented retry count
            sqlx::query(
                "UPDATE task_queue
                 SET status = 'pending'::task_status, retry_count = $1, error_message = $2,
                     started_at = NULL
                 WHERE id = $3",
            )
            .bind(retry_count + 1)
            .bind(error)
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        } else {
            // Retry budget spent: mark as failed
            sqlx::query(
                "UPDATE task_queue
                 SET status = 'failed'::task_status, completed_at = $1, error_message = $2
                 WHERE id = $3",
            )
            .bind(now)
            .bind(error)
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        self.notify.notify_waiters();
        Ok(())
    }

    async fn get(&self, task_id: Uuid) -> Result<Option<Task>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM task_queue WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_task_row))
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM task_queue WHERE status = 'pending'::task_status",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_type_all_variants() {
        assert_eq!(
            PgTaskRepository::parse_task_type("regenerate_job_matches"),
            TaskType::RegenerateJobMatches
        );
        assert_eq!(
            PgTaskRepository::parse_task_type("regenerate_candidate_matches"),
            TaskType::RegenerateCandidateMatches
        );
        assert_eq!(
            PgTaskRepository::parse_task_type("dispatch_proposal"),
            TaskType::DispatchProposal
        );
        assert_eq!(
            PgTaskRepository::parse_task_type("purge_expired_matches"),
            TaskType::PurgeExpiredMatches
        );
    }

    #[test]
    fn test_parse_task_type_unknown_fallback() {
        assert_eq!(
            PgTaskRepository::parse_task_type("unknown_type"),
            TaskType::PurgeExpiredMatches
        );
    }

    #[test]
    fn test_parse_task_status_all_variants() {
        assert_eq!(
            PgTaskRepository::parse_task_status("pending"),
            TaskStatus::Pending
        );
        assert_eq!(
            PgTaskRepository::parse_task_status("running"),
            TaskStatus::Running
        );
        assert_eq!(
            PgTaskRepository::parse_task_status("completed"),
            TaskStatus::Completed
        );
        assert_eq!(
            PgTaskRepository::parse_task_status("failed"),
            TaskStatus::Failed
        );
        assert_eq!(
            PgTaskRepository::parse_task_status("cancelled"),
            TaskStatus::Cancelled
        );
    }

    #[test]
    fn test_parse_task_status_unknown_fallback() {
        assert_eq!(
            PgTaskRepository::parse_task_status(""),
            TaskStatus::Pending
        );
    }
}
