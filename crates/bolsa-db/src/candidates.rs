//! Candidate repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bolsa_core::{Candidate, CandidateRepository, Error, Result};

/// PostgreSQL implementation of CandidateRepository.
pub struct PgCandidateRepository {
    pool: Pool<Postgres>,
}

impl PgCandidateRepository {
    /// Create a new PgCandidateRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateRepository for PgCandidateRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query(
            "SELECT id, email, name, phone, role, description, cv_url, embedding,
                    confirmed, created_at, updated_at
             FROM candidate
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Candidate {
            id: r.get("id"),
            email: r.get("email"),
            name: r.get("name"),
            phone: r.get("phone"),
            role: r.get("role"),
            description: r.get("description"),
            cv_url: r.get("cv_url"),
            embedding: r.get::<Option<Vector>, _>("embedding"),
            confirmed: r.get("confirmed"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn set_resume(&self, id: Uuid, cv_url: &str, description: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE candidate
             SET cv_url = $1,
                 description = COALESCE($2, description),
                 updated_at = $3
             WHERE id = $4",
        )
        .bind(cv_url)
        .bind(description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CandidateNotFound(id));
        }
        Ok(())
    }

    async fn set_embedding(&self, id: Uuid, embedding: Vector) -> Result<()> {
        let result =
            sqlx::query("UPDATE candidate SET embedding = $1, updated_at = $2 WHERE id = $3")
                .bind(embedding)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::CandidateNotFound(id));
        }
        Ok(())
    }
}
