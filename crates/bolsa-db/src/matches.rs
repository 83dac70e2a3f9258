//! Match repository implementation.
//!
//! Match rows are regenerated wholesale (delete-then-insert) whenever either
//! side's embedding changes, so a match's lifetime is bounded by the
//! freshness of its parent entities. Scoring happens inside PostgreSQL with
//! pgvector's cosine-distance operator.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use bolsa_core::{
    new_v7, Error, Match, MatchApplication, MatchInvite, MatchPreview, MatchRepository,
    MatchStatus, MatchSummary, Result,
};

/// PostgreSQL implementation of MatchRepository.
pub struct PgMatchRepository {
    pool: Pool<Postgres>,
}

impl PgMatchRepository {
    /// Create a new PgMatchRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_status(s: &str) -> MatchStatus {
        s.parse().unwrap_or(MatchStatus::Pending) // fallback
    }

    fn parse_invite_row(row: sqlx::postgres::PgRow) -> MatchInvite {
        MatchInvite {
            match_id: row.get("id"),
            job_id: row.get("job_id"),
            candidate_id: row.get("candidate_id"),
            score: row.get("score"),
            status: Self::parse_status(row.get("status")),
            apply_token: row.get("apply_token"),
            job_title: row.get("job_title"),
            job_contact_email: row.get("job_contact_email"),
            job_contact_phone: row.get("job_contact_phone"),
            candidate_name: row.get("candidate_name"),
            candidate_email: row.get("candidate_email"),
            candidate_cv_url: row.get("candidate_cv_url"),
        }
    }
}

/// Joined columns an invitation needs, shared by `pending_invites` and
/// `invite_details`.
const INVITE_SELECT: &str = "SELECT m.id, m.job_id, m.candidate_id, m.score, m.status::text AS status,
            m.apply_token,
            j.title AS job_title,
            j.contact_email AS job_contact_email,
            j.contact_phone AS job_contact_phone,
            c.name AS candidate_name,
            c.email AS candidate_email,
            c.cv_url AS candidate_cv_url
     FROM matches m
     JOIN job_posting j ON j.id = m.job_id
     JOIN candidate c ON c.id = m.candidate_id";

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn regenerate_for_job(&self, job_id: Uuid) -> Result<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM matches WHERE job_id = $1")
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let inserted = sqlx::query(
            "INSERT INTO matches (job_id, candidate_id, score, status, created_at)
             SELECT j.id, c.id,
                    (1 - (j.embedding <=> c.embedding))::real,
                    'pending'::match_status, $2
             FROM job_posting j, candidate c
             WHERE j.id = $1
               AND j.embedding IS NOT NULL
               AND c.embedding IS NOT NULL
               AND (j.expires_at IS NULL OR j.expires_at > $2)",
        )
        .bind(job_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(inserted.rows_affected() as i64)
    }

    async fn regenerate_for_candidate(&self, candidate_id: Uuid) -> Result<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM matches WHERE candidate_id = $1")
            .bind(candidate_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let inserted = sqlx::query(
            "INSERT INTO matches (job_id, candidate_id, score, status, created_at)
             SELECT j.id, c.id,
                    (1 - (j.embedding <=> c.embedding))::real,
                    'pending'::match_status, $2
             FROM job_posting j, candidate c
             WHERE c.id = $1
               AND c.embedding IS NOT NULL
               AND j.embedding IS NOT NULL
               AND (j.expires_at IS NULL OR j.expires_at > $2)",
        )
        .bind(candidate_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(inserted.rows_affected() as i64)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Match>> {
        let row = sqlx::query(
            "SELECT id, job_id, candidate_id, score, status::text AS status, apply_token,
                    sent_at, applied_at, created_at
             FROM matches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Match {
            id: r.get("id"),
            job_id: r.get("job_id"),
            candidate_id: r.get("candidate_id"),
            score: r.get("score"),
            status: Self::parse_status(r.get("status")),
            apply_token: r.get("apply_token"),
            sent_at: r.get("sent_at"),
            applied_at: r.get("applied_at"),
            created_at: r.get("created_at"),
        }))
    }

    async fn pending_invites(&self, job_id: Uuid, threshold: f32) -> Result<Vec<MatchInvite>> {
        let query = format!(
            "{INVITE_SELECT}
             WHERE m.job_id = $1
               AND m.status = 'pending'::match_status
               AND m.score >= $2
             ORDER BY m.score DESC"
        );

        let rows = sqlx::query(&query)
            .bind(job_id)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_invite_row).collect())
    }

    async fn invite_details(&self, match_id: Uuid) -> Result<Option<MatchInvite>> {
        let query = format!("{INVITE_SELECT} WHERE m.id = $1");

        let row = sqlx::query(&query)
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_invite_row))
    }

    async fn set_token(&self, match_id: Uuid, token: &str) -> Result<()> {
        sqlx::query("UPDATE matches SET apply_token = $1 WHERE id = $2")
            .bind(token)
            .bind(match_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_sent(&self, match_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE matches SET status = 'sent'::match_status, sent_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(match_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_resent(&self, match_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE matches SET status = 'resent'::match_status, sent_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(match_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn apply(&self, token: &str) -> Result<MatchApplication> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Claim the match first: the status + applied_at guard combined with
        // row locking makes the first committer win; a concurrent click sees
        // zero matching rows and gets NotFound.
        let claimed = sqlx::query(
            "UPDATE matches
             SET status = 'applied'::match_status, applied_at = $2
             WHERE apply_token = $1
               AND status = 'sent'::match_status
               AND applied_at IS NULL
             RETURNING id, job_id, candidate_id",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let Some(row) = claimed else {
            return Err(Error::NotFound(
                "Apply token invalid or already used".to_string(),
            ));
        };

        let match_id: Uuid = row.get("id");
        let job_id: Uuid = row.get("job_id");
        let candidate_id: Uuid = row.get("candidate_id");

        // An existing proposal for the pair is success, not error.
        let proposal_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO proposals (id, job_id, applicant_id, label, status, created_at)
             SELECT $1, $2, $3, j.label, 'pending'::proposal_status, $4
             FROM job_posting j
             WHERE j.id = $2
               AND NOT EXISTS (
                   SELECT 1 FROM proposals
                   WHERE job_id = $2 AND applicant_id = $3
               )
             RETURNING id",
        )
        .bind(new_v7())
        .bind(job_id)
        .bind(candidate_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(MatchApplication {
            match_id,
            job_id,
            candidate_id,
            proposal_id,
        })
    }

    async fn list_admin(&self, threshold: f32) -> Result<Vec<MatchSummary>> {
        let rows = sqlx::query(
            "SELECT m.id, m.score, m.status::text AS status, m.sent_at,
                    j.id AS job_id, j.title AS job_title,
                    c.id AS candidate_id, c.email AS candidate_email
             FROM matches m
             JOIN job_posting j ON j.id = m.job_id
             JOIN candidate c ON c.id = m.candidate_id
             WHERE m.score >= $1
             ORDER BY m.sent_at DESC NULLS FIRST, m.id DESC",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| MatchSummary {
                id: r.get("id"),
                score: r.get("score"),
                status: Self::parse_status(r.get("status")),
                sent_at: r.get("sent_at"),
                job_id: r.get("job_id"),
                job_title: r.get("job_title"),
                candidate_id: r.get("candidate_id"),
                candidate_email: r.get("candidate_email"),
            })
            .collect())
    }

    async fn preview_for_job(&self, job_id: Uuid, limit: i64) -> Result<Vec<MatchPreview>> {
        let rows = sqlx::query(
            "SELECT m.job_id, m.candidate_id, m.score,
                    j.title AS job_title, c.name AS candidate_name
             FROM matches m
             JOIN job_posting j ON j.id = m.job_id
             JOIN candidate c ON c.id = m.candidate_id
             WHERE m.job_id = $1
             ORDER BY m.score DESC
             LIMIT $2",
        )
        .bind(job_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_preview_row).collect())
    }

    async fn preview_for_candidate(
        &self,
        candidate_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MatchPreview>> {
        let rows = sqlx::query(
            "SELECT m.job_id, m.candidate_id, m.score,
                    j.title AS job_title, c.name AS candidate_name
             FROM matches m
             JOIN job_posting j ON j.id = m.job_id
             JOIN candidate c ON c.id = m.candidate_id
             WHERE m.candidate_id = $1
             ORDER BY m.score DESC
             LIMIT $2",
        )
        .bind(candidate_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(parse_preview_row).collect())
    }

    async fn purge_expired(&self) -> Result<(i64, i64)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let expired = sqlx::query(
            "DELETE FROM matches
             USING job_posting j
             WHERE matches.job_id = j.id
               AND j.expires_at IS NOT NULL
               AND j.expires_at < $1",
        )
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let orphaned = sqlx::query(
            "DELETE FROM matches m
             WHERE NOT EXISTS (
                 SELECT 1 FROM job_posting j WHERE j.id = m.job_id
             )",
        )
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok((
            expired.rows_affected() as i64,
            orphaned.rows_affected() as i64,
        ))
    }
}

fn parse_preview_row(row: sqlx::postgres::PgRow) -> MatchPreview {
    MatchPreview {
        job_id: row.get("job_id"),
        candidate_id: row.get("candidate_id"),
        score: row.get("score"),
        job_title: row.get("job_title"),
        candidate_name: row.get("candidate_name"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_known_values() {
        assert_eq!(PgMatchRepository::parse_status("sent"), MatchStatus::Sent);
        assert_eq!(
            PgMatchRepository::parse_status("applied"),
            MatchStatus::Applied
        );
    }

    #[test]
    fn test_parse_status_unknown_falls_back_to_pending() {
        assert_eq!(
            PgMatchRepository::parse_status("garbage"),
            MatchStatus::Pending
        );
    }
}
