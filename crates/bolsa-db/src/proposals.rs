//! Proposal repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bolsa_core::{
    new_v7, CreateProposalRequest, Error, Proposal, ProposalDispatch, ProposalLabel,
    ProposalRepository, ProposalStatus, ProposalSummary, Result,
};

/// PostgreSQL implementation of ProposalRepository.
pub struct PgProposalRepository {
    pool: Pool<Postgres>,
}

impl PgProposalRepository {
    /// Create a new PgProposalRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_status(s: &str) -> ProposalStatus {
        s.parse().unwrap_or(ProposalStatus::Pending) // fallback
    }

    fn parse_label(s: &str) -> ProposalLabel {
        s.parse().unwrap_or(ProposalLabel::Manual) // fallback
    }

    fn parse_proposal_row(row: &sqlx::postgres::PgRow) -> Proposal {
        Proposal {
            id: row.get("id"),
            job_id: row.get("job_id"),
            applicant_id: row.get("applicant_id"),
            label: Self::parse_label(row.get("label")),
            status: Self::parse_status(row.get("status")),
            created_at: row.get("created_at"),
            sent_at: row.get("sent_at"),
            cancelled_at: row.get("cancelled_at"),
            notes: row.get("notes"),
        }
    }
}

#[async_trait]
impl ProposalRepository for PgProposalRepository {
    async fn create_if_absent(&self, req: CreateProposalRequest) -> Result<Option<Uuid>> {
        // Automatic proposals wait for the delayed dispatcher; manual ones
        // are immediately actionable by an admin.
        let status = match req.label {
            ProposalLabel::Automatic => ProposalStatus::Waiting,
            ProposalLabel::Manual => ProposalStatus::Pending,
        };

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO proposals (id, job_id, applicant_id, label, status, created_at)
             SELECT $1, $2, $3, $4::proposal_label, $5::proposal_status, $6
             WHERE NOT EXISTS (
                 SELECT 1 FROM proposals
                 WHERE job_id = $2 AND applicant_id = $3
             )
             RETURNING id",
        )
        .bind(new_v7())
        .bind(req.job_id)
        .bind(req.applicant_id)
        .bind(req.label.to_string())
        .bind(status.to_string())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Proposal>> {
        let row = sqlx::query(
            "SELECT id, job_id, applicant_id, label::text AS label, status::text AS status,
                    created_at, sent_at, cancelled_at, notes
             FROM proposals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Self::parse_proposal_row(&r)))
    }

    async fn dispatch_details(&self, id: Uuid) -> Result<Option<ProposalDispatch>> {
        let row = sqlx::query(
            "SELECT p.id, p.job_id, p.applicant_id, p.label::text AS label,
                    p.status::text AS status, p.created_at, p.sent_at, p.cancelled_at, p.notes,
                    j.title AS job_title,
                    a.name AS applicant_name,
                    a.email AS applicant_email,
                    a.cv_url AS applicant_cv_url,
                    e.name AS employer_name,
                    e.email AS employer_email,
                    e.phone AS employer_phone
             FROM proposals p
             JOIN job_posting j ON j.id = p.job_id
             JOIN candidate a ON a.id = p.applicant_id
             JOIN candidate e ON e.id = j.owner_id
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| ProposalDispatch {
            proposal: Self::parse_proposal_row(&r),
            job_title: r.get("job_title"),
            applicant_name: r.get("applicant_name"),
            applicant_email: r.get("applicant_email"),
            applicant_cv_url: r.get("applicant_cv_url"),
            employer_name: r.get("employer_name"),
            employer_email: r.get("employer_email"),
            employer_phone: r.get("employer_phone"),
        }))
    }

    async fn mark_sent(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE proposals SET status = 'sent'::proposal_status, sent_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn cancel_active(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE proposals
             SET status = 'cancelled'::proposal_status, cancelled_at = $1
             WHERE job_id = $2 AND applicant_id = $3
               AND status IN ('waiting'::proposal_status, 'pending'::proposal_status)
             RETURNING id",
        )
        .bind(Utc::now())
        .bind(job_id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn cancel_for_job(&self, job_id: Uuid) -> Result<i64> {
        let result = sqlx::query(
            "UPDATE proposals
             SET status = 'cancelled'::proposal_status, cancelled_at = $1
             WHERE job_id = $2
               AND status IN ('waiting'::proposal_status, 'pending'::proposal_status)",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() as i64)
    }

    async fn list_admin(&self) -> Result<Vec<ProposalSummary>> {
        let rows = sqlx::query(
            "SELECT p.id, p.label::text AS label, p.status::text AS status,
                    p.created_at, p.sent_at, p.notes,
                    j.id AS job_id, j.title AS job_title,
                    a.id AS applicant_id, a.name AS applicant_name, a.email AS applicant_email
             FROM proposals p
             JOIN job_posting j ON j.id = p.job_id
             JOIN candidate a ON a.id = p.applicant_id
             ORDER BY p.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| ProposalSummary {
                id: r.get("id"),
                label: Self::parse_label(r.get("label")),
                status: Self::parse_status(r.get("status")),
                created_at: r.get("created_at"),
                sent_at: r.get("sent_at"),
                notes: r.get("notes"),
                job_id: r.get("job_id"),
                job_title: r.get("job_title"),
                applicant_id: r.get("applicant_id"),
                applicant_name: r.get("applicant_name"),
                applicant_email: r.get("applicant_email"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_fallback() {
        assert_eq!(
            PgProposalRepository::parse_label("automatic"),
            ProposalLabel::Automatic
        );
        assert_eq!(
            PgProposalRepository::parse_label("garbage"),
            ProposalLabel::Manual
        );
    }

    #[test]
    fn test_parse_status_fallback() {
        assert_eq!(
            PgProposalRepository::parse_status("waiting"),
            ProposalStatus::Waiting
        );
        assert_eq!(
            PgProposalRepository::parse_status(""),
            ProposalStatus::Pending
        );
    }
}
