//! Match generation, invitation fan-out, resend, and apply-token
//! resolution.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use bolsa_core::{
    apply_link, defaults, generate_apply_token, render, score_percent, CandidateRepository,
    Error, JobRepository, MatchApplication, MatchInvite, MatchRepository, ProposalLabel,
    RenderedMessage, Result, TemplateContext, TemplateRepository,
};
use bolsa_db::Database;
use bolsa_notify::Notifier;

/// Configuration for the match engine.
#[derive(Debug, Clone)]
pub struct MatchEngineConfig {
    /// Base URL for apply links embedded in invitations.
    pub frontend_base_url: String,
    /// Minimum score for a match to trigger an automatic invitation.
    pub score_threshold: f32,
}

impl Default for MatchEngineConfig {
    fn default() -> Self {
        Self {
            frontend_base_url: defaults::FRONTEND_BASE_URL.to_string(),
            score_threshold: defaults::MATCH_SCORE_THRESHOLD,
        }
    }
}

/// Result of a job-side regeneration pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerationReport {
    /// Match rows inserted by the delete-then-insert pass.
    pub inserted: i64,
    /// Invitations delivered and marked sent.
    pub invited: usize,
    /// Invitations that failed delivery and were skipped.
    pub failed: usize,
}

/// The matching pipeline: turns a new or changed entity into scored match
/// rows and tracked invitations.
pub struct MatchEngine {
    db: Database,
    notifier: Arc<dyn Notifier>,
    config: MatchEngineConfig,
}

impl MatchEngine {
    /// Create a new match engine.
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, config: MatchEngineConfig) -> Self {
        Self {
            db,
            notifier,
            config,
        }
    }

    /// Recompute all matches for a job and invite candidates scoring at or
    /// above the threshold.
    ///
    /// A job without an embedding is a logged no-op. One invitation failing
    /// to deliver is logged and skipped; it neither aborts the remaining
    /// invitations nor rolls back the regenerated match rows.
    #[instrument(skip(self))]
    pub async fn regenerate_for_job(&self, job_id: Uuid) -> Result<RegenerationReport> {
        let start = Instant::now();

        let job = self
            .db
            .jobs
            .get(job_id)
            .await?
            .ok_or(Error::JobNotFound(job_id))?;

        if job.embedding.is_none() {
            warn!(
                subsystem = "match",
                op = "regenerate_for_job",
                %job_id,
                "Job has no embedding; skipping match regeneration"
            );
            return Ok(RegenerationReport::default());
        }

        let inserted = self.db.matches.regenerate_for_job(job_id).await?;

        let invites = self
            .db
            .matches
            .pending_invites(job_id, self.config.score_threshold)
            .await?;

        let template = self.db.templates.default_for(ProposalLabel::Automatic).await?;

        let mut report = RegenerationReport {
            inserted,
            ..Default::default()
        };

        for invite in invites {
            // The token is persisted before the delivery attempt so a retry
            // or resend reuses the link already generated.
            let token = generate_apply_token();
            self.db.matches.set_token(invite.match_id, &token).await?;

            let link = apply_link(&self.config.frontend_base_url, &token);
            let message = match &template {
                Some(tpl) => render(tpl, &invite_context(&invite, &link)),
                None => builtin_invitation(&invite, &link),
            };

            match self
                .notifier
                .send_email(
                    &invite.candidate_email,
                    &message.subject,
                    &message.body,
                    invite.candidate_cv_url.as_deref(),
                )
                .await
            {
                Ok(()) => {
                    self.db.matches.mark_sent(invite.match_id).await?;
                    report.invited += 1;
                }
                Err(e) => {
                    warn!(
                        subsystem = "match",
                        op = "invite",
                        match_id = %invite.match_id,
                        candidate_email = %invite.candidate_email,
                        error = %e,
                        "Invitation delivery failed; continuing with remaining matches"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            subsystem = "match",
            op = "regenerate_for_job",
            %job_id,
            inserted = report.inserted,
            invited = report.invited,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Job match regeneration complete"
        );
        Ok(report)
    }

    /// Recompute all matches for a candidate.
    ///
    /// No invitations go out from this side: the job-centric batch is the
    /// outward-facing announcement, the candidate-side pass only refreshes
    /// pool state for job owners to review.
    #[instrument(skip(self))]
    pub async fn regenerate_for_candidate(&self, candidate_id: Uuid) -> Result<i64> {
        let candidate = self
            .db
            .candidates
            .get(candidate_id)
            .await?
            .ok_or(Error::CandidateNotFound(candidate_id))?;

        if candidate.embedding.is_none() {
            warn!(
                subsystem = "match",
                op = "regenerate_for_candidate",
                %candidate_id,
                "Candidate has no embedding; skipping match regeneration"
            );
            return Ok(0);
        }

        let inserted = self.db.matches.regenerate_for_candidate(candidate_id).await?;

        info!(
            subsystem = "match",
            op = "regenerate_for_candidate",
            %candidate_id,
            inserted,
            "Candidate match regeneration complete"
        );
        Ok(inserted)
    }

    /// Re-send the notification for a match to the job's contact address.
    ///
    /// Idempotent: the apply token is never replaced, so previously
    /// distributed links keep working; only status and sent_at move.
    #[instrument(skip(self))]
    pub async fn resend(&self, match_id: Uuid) -> Result<()> {
        let invite = self
            .db
            .matches
            .invite_details(match_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Match {} not found", match_id)))?;

        let Some(contact_email) = invite.job_contact_email.clone() else {
            return Err(Error::InvalidInput(
                "job has no contact email".to_string(),
            ));
        };

        let message = resend_message(&invite);
        self.notifier
            .send_email(
                &contact_email,
                &message.subject,
                &message.body,
                invite.candidate_cv_url.as_deref(),
            )
            .await?;

        // Phone channel is best-effort
        if let Some(phone) = &invite.job_contact_phone {
            if let Err(e) = self.notifier.send_whatsapp(phone, &message.body).await {
                warn!(
                    subsystem = "match",
                    op = "resend",
                    %match_id,
                    error = %e,
                    "WhatsApp resend failed; email already delivered"
                );
            }
        }

        self.db.matches.mark_resent(match_id).await?;
        info!(subsystem = "match", op = "resend", %match_id, "Match resent");
        Ok(())
    }

    /// Consume an apply token: exactly-once conversion of a sent match into
    /// a tracked application.
    #[instrument(skip(self, token))]
    pub async fn apply(&self, token: &str) -> Result<MatchApplication> {
        let application = self.db.matches.apply(token.trim()).await?;

        info!(
            subsystem = "match",
            op = "apply",
            match_id = %application.match_id,
            job_id = %application.job_id,
            candidate_id = %application.candidate_id,
            proposal_created = application.proposal_id.is_some(),
            "Apply token consumed"
        );
        Ok(application)
    }
}

/// Template context for an invitation: `{{applicant_name}}`, `{{job_title}}`,
/// `{{cv_url}}`, `{{score}}` (percentage, one decimal), `{{apply_link}}`.
pub fn invite_context(invite: &MatchInvite, link: &str) -> TemplateContext {
    let mut ctx = TemplateContext::new();
    ctx.insert("applicant_name".to_string(), invite.candidate_name.clone());
    ctx.insert("job_title".to_string(), invite.job_title.clone());
    ctx.insert(
        "cv_url".to_string(),
        invite.candidate_cv_url.clone().unwrap_or_default(),
    );
    ctx.insert("score".to_string(), score_percent(invite.score));
    ctx.insert("apply_link".to_string(), link.to_string());
    ctx
}

/// Fixed invitation composition used when no default automatic template is
/// configured.
pub fn builtin_invitation(invite: &MatchInvite, link: &str) -> RenderedMessage {
    RenderedMessage {
        subject: format!(
            "¡{}, encontramos una nueva oportunidad para ti!",
            invite.candidate_name
        ),
        body: format!(
            "Hola, {}.\n\n\
             Basado en tu perfil, encontramos una oferta laboral con una \
             compatibilidad del {} % contigo.\n\n\
             Puesto: {}\n\n\
             Si te interesa, podés postularte directamente desde este enlace único:\n{}\n\n\
             Saludos,\nEl equipo de Bolsa",
            invite.candidate_name,
            score_percent(invite.score),
            invite.job_title,
            link
        ),
    }
}

/// Fixed composition for admin-triggered resends, addressed to the job
/// contact.
pub fn resend_message(invite: &MatchInvite) -> RenderedMessage {
    RenderedMessage {
        subject: format!(
            "Reenvío – Matching {} ↔ «{}»",
            invite.candidate_name, invite.job_title
        ),
        body: format!(
            "El candidato {} ({}) coincide con «{}» con un score de {} %.",
            invite.candidate_name,
            invite.candidate_email,
            invite.job_title,
            score_percent(invite.score)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolsa_core::MatchStatus;

    fn invite() -> MatchInvite {
        MatchInvite {
            match_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            score: 0.85,
            status: MatchStatus::Pending,
            apply_token: None,
            job_title: "Dev backend".to_string(),
            job_contact_email: Some("rrhh@empresa.example".to_string()),
            job_contact_phone: None,
            candidate_name: "Ana".to_string(),
            candidate_email: "ana@test.example".to_string(),
            candidate_cv_url: Some("https://files.test/cv.pdf".to_string()),
        }
    }

    #[test]
    fn test_invite_context_keys() {
        let ctx = invite_context(&invite(), "https://bolsa.example.org/api/job/apply/tok");
        assert_eq!(ctx.get("applicant_name").unwrap(), "Ana");
        assert_eq!(ctx.get("job_title").unwrap(), "Dev backend");
        assert_eq!(ctx.get("cv_url").unwrap(), "https://files.test/cv.pdf");
        assert_eq!(ctx.get("score").unwrap(), "85.0");
        assert_eq!(
            ctx.get("apply_link").unwrap(),
            "https://bolsa.example.org/api/job/apply/tok"
        );
    }

    #[test]
    fn test_invite_context_missing_cv_is_empty() {
        let mut inv = invite();
        inv.candidate_cv_url = None;
        let ctx = invite_context(&inv, "link");
        assert_eq!(ctx.get("cv_url").unwrap(), "");
    }

    #[test]
    fn test_builtin_invitation_mentions_score_and_link() {
        let message = builtin_invitation(&invite(), "https://l.example/apply/t");
        assert!(message.subject.contains("Ana"));
        assert!(message.body.contains("85.0 %"));
        assert!(message.body.contains("https://l.example/apply/t"));
        assert!(message.body.contains("Dev backend"));
    }

    #[test]
    fn test_resend_message_addresses_employer() {
        let message = resend_message(&invite());
        assert!(message.subject.contains("Reenvío"));
        assert!(message.body.contains("ana@test.example"));
        assert!(message.body.contains("85.0 %"));
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = MatchEngineConfig::default();
        assert_eq!(config.score_threshold, defaults::MATCH_SCORE_THRESHOLD);
        assert_eq!(config.frontend_base_url, defaults::FRONTEND_BASE_URL);
    }
}
