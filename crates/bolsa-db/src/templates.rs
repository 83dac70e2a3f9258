//! Proposal template repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bolsa_core::{
    new_v7, CreateTemplateRequest, Error, ProposalLabel, ProposalTemplate, Result,
    TemplateRepository, UpdateTemplateRequest,
};

/// PostgreSQL implementation of TemplateRepository.
pub struct PgTemplateRepository {
    pool: Pool<Postgres>,
}

impl PgTemplateRepository {
    /// Create a new PgTemplateRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_template_row(row: sqlx::postgres::PgRow) -> ProposalTemplate {
        ProposalTemplate {
            id: row.get("id"),
            name: row.get("name"),
            kind: row
                .get::<String, _>("kind")
                .parse()
                .unwrap_or(ProposalLabel::Manual), // fallback
            subject: row.get("subject"),
            body: row.get("body"),
            is_default: row.get("is_default"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn create(&self, req: CreateTemplateRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO proposal_templates (id, name, kind, subject, body, is_default, created_at, updated_at)
             VALUES ($1, $2, $3::proposal_label, $4, $5, FALSE, $6, $7)",
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.kind.to_string())
        .bind(&req.subject)
        .bind(&req.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProposalTemplate>> {
        let row = sqlx::query(
            "SELECT id, name, kind::text AS kind, subject, body, is_default, created_at, updated_at
             FROM proposal_templates
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_template_row))
    }

    async fn default_for(&self, kind: ProposalLabel) -> Result<Option<ProposalTemplate>> {
        let row = sqlx::query(
            "SELECT id, name, kind::text AS kind, subject, body, is_default, created_at, updated_at
             FROM proposal_templates
             WHERE kind = $1::proposal_label AND is_default = TRUE",
        )
        .bind(kind.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_template_row))
    }

    async fn list(&self) -> Result<Vec<ProposalTemplate>> {
        let rows = sqlx::query(
            "SELECT id, name, kind::text AS kind, subject, body, is_default, created_at, updated_at
             FROM proposal_templates
             ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_template_row).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateTemplateRequest) -> Result<()> {
        let now = Utc::now();

        // Build dynamic update query
        let mut updates = vec!["updated_at = $1".to_string()];
        let mut param_count = 2;

        if req.name.is_some() {
            updates.push(format!("name = ${}", param_count));
            param_count += 1;
        }
        if req.kind.is_some() {
            updates.push(format!("kind = ${}::proposal_label", param_count));
            param_count += 1;
        }
        if req.subject.is_some() {
            updates.push(format!("subject = ${}", param_count));
            param_count += 1;
        }
        if req.body.is_some() {
            updates.push(format!("body = ${}", param_count));
            param_count += 1;
        }

        let query = format!(
            "UPDATE proposal_templates SET {} WHERE id = ${}",
            updates.join(", "),
            param_count
        );

        let mut q = sqlx::query(&query).bind(now);

        if let Some(name) = &req.name {
            q = q.bind(name);
        }
        if let Some(kind) = req.kind {
            q = q.bind(kind.to_string());
        }
        if let Some(subject) = &req.subject {
            q = q.bind(subject);
        }
        if let Some(body) = &req.body {
            q = q.bind(body);
        }

        let result = q
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Template {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM proposal_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Template {} not found", id)));
        }
        Ok(())
    }

    async fn set_default(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let kind: Option<String> =
            sqlx::query_scalar("SELECT kind::text FROM proposal_templates WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let Some(kind) = kind else {
            return Err(Error::NotFound(format!("Template {} not found", id)));
        };

        // Clear the previous default for this kind, then mark the new one,
        // atomically. Defaults for the other kind are untouched.
        sqlx::query(
            "UPDATE proposal_templates SET is_default = FALSE, updated_at = $1
             WHERE kind = $2::proposal_label AND is_default = TRUE",
        )
        .bind(Utc::now())
        .bind(&kind)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            "UPDATE proposal_templates SET is_default = TRUE, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
