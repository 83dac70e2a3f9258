//! Job posting repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bolsa_core::{
    new_v7, CreateJobRequest, Error, Job, JobRepository, JobSummary, ProposalLabel, Result,
    UpdateJobRequest,
};

/// PostgreSQL implementation of JobRepository.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_label(s: &str) -> ProposalLabel {
        s.parse().unwrap_or(ProposalLabel::Manual) // fallback
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn insert(&self, req: CreateJobRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO job_posting
                 (id, title, description, requirements, expires_at, owner_id,
                  source, label, contact_email, contact_phone, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8::proposal_label, $9, $10, $11, $12)",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.requirements)
        .bind(req.expires_at)
        .bind(req.owner_id)
        .bind(&req.source)
        .bind(req.label.to_string())
        .bind(&req.contact_email)
        .bind(&req.contact_phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query(
            "SELECT id, title, description, requirements, expires_at, owner_id, embedding,
                    source, label::text AS label, contact_email, contact_phone,
                    created_at, updated_at
             FROM job_posting
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Job {
            id: r.get("id"),
            title: r.get("title"),
            description: r.get("description"),
            requirements: r.get("requirements"),
            expires_at: r.get("expires_at"),
            owner_id: r.get("owner_id"),
            embedding: r.get::<Option<Vector>, _>("embedding"),
            source: r.get("source"),
            label: Self::parse_label(r.get("label")),
            contact_email: r.get("contact_email"),
            contact_phone: r.get("contact_phone"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn update(&self, id: Uuid, req: UpdateJobRequest) -> Result<()> {
        let now = Utc::now();

        // Build dynamic update query
        let mut updates = vec!["updated_at = $1".to_string()];
        let mut param_count = 2;

        if req.title.is_some() {
            updates.push(format!("title = ${}", param_count));
            param_count += 1;
        }
        if req.description.is_some() {
            updates.push(format!("description = ${}", param_count));
            param_count += 1;
        }
        if req.requirements.is_some() {
            updates.push(format!("requirements = ${}", param_count));
            param_count += 1;
        }
        if req.expires_at.is_some() {
            updates.push(format!("expires_at = ${}", param_count));
            param_count += 1;
        }
        if req.label.is_some() {
            updates.push(format!("label = ${}::proposal_label", param_count));
            param_count += 1;
        }
        if req.contact_email.is_some() {
            updates.push(format!("contact_email = ${}", param_count));
            param_count += 1;
        }
        if req.contact_phone.is_some() {
            updates.push(format!("contact_phone = ${}", param_count));
            param_count += 1;
        }

        let query = format!(
            "UPDATE job_posting SET {} WHERE id = ${}",
            updates.join(", "),
            param_count
        );

        let mut q = sqlx::query(&query).bind(now);

        if let Some(title) = &req.title {
            q = q.bind(title);
        }
        if let Some(description) = &req.description {
            q = q.bind(description);
        }
        if let Some(requirements) = &req.requirements {
            q = q.bind(requirements);
        }
        if let Some(expires_at) = req.expires_at {
            q = q.bind(expires_at);
        }
        if let Some(label) = req.label {
            q = q.bind(label.to_string());
        }
        if let Some(contact_email) = &req.contact_email {
            q = q.bind(contact_email);
        }
        if let Some(contact_phone) = &req.contact_phone {
            q = q.bind(contact_phone);
        }

        let result = q
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_posting WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn set_embedding(&self, id: Uuid, embedding: Vector) -> Result<()> {
        let result =
            sqlx::query("UPDATE job_posting SET embedding = $1, updated_at = $2 WHERE id = $3")
                .bind(embedding)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    async fn list(&self, include_expired: bool) -> Result<Vec<JobSummary>> {
        let expiry_clause = if include_expired {
            ""
        } else {
            "WHERE j.expires_at IS NULL OR j.expires_at > NOW()"
        };

        let query = format!(
            "SELECT j.id, j.title, j.description, j.requirements, j.expires_at, j.owner_id,
                    j.source, j.label::text AS label, j.contact_email, j.contact_phone,
                    j.created_at,
                    COUNT(p.*) FILTER (
                        WHERE p.status NOT IN ('cancelled'::proposal_status)
                    ) AS candidates_count
             FROM job_posting j
             LEFT JOIN proposals p ON p.job_id = j.id
             {}
             GROUP BY j.id
             ORDER BY j.created_at DESC",
            expiry_clause
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| JobSummary {
                id: r.get("id"),
                title: r.get("title"),
                description: r.get("description"),
                requirements: r.get("requirements"),
                expires_at: r.get("expires_at"),
                owner_id: r.get("owner_id"),
                source: r.get("source"),
                label: Self::parse_label(r.get("label")),
                contact_email: r.get("contact_email"),
                contact_phone: r.get("contact_phone"),
                candidates_count: r.get("candidates_count"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
