//! Proposal creation and delayed dispatch.
//!
//! Automatic proposals sit in `waiting` for a fixed window before the
//! employer is notified. The dispatcher re-reads the proposal's status
//! immediately before acting; any status change during the window silently
//! supersedes the scheduled send; that re-check is the cancellation
//! mechanism.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use bolsa_core::{
    defaults, render, CreateProposalRequest, Error, ProposalDispatch, ProposalLabel,
    ProposalRepository, ProposalStatus, ProposalTaskPayload, RenderedMessage, Result,
    TaskRepository, TaskType, TemplateContext, TemplateRepository,
};
use bolsa_db::Database;
use bolsa_notify::Notifier;

/// Outcome of a proposal creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Proposal created with this ID.
    Created(Uuid),
    /// A proposal already existed for the (job, applicant) pair.
    Duplicate,
}

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Employer notified, proposal marked sent.
    Sent,
    /// The proposal's status no longer allowed dispatch; nothing was sent.
    Superseded,
}

/// Creates proposals and dispatches employer notifications.
pub struct ProposalScheduler {
    db: Database,
    notifier: Arc<dyn Notifier>,
    send_delay: Duration,
}

impl ProposalScheduler {
    /// Create a new scheduler with the given dispatch delay.
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, send_delay: Duration) -> Self {
        Self {
            db,
            notifier,
            send_delay,
        }
    }

    /// Create a proposal. Automatic proposals additionally enqueue a
    /// delayed dispatch task; the delay is the candidate's cancellation
    /// window.
    #[instrument(skip(self))]
    pub async fn create(&self, req: CreateProposalRequest) -> Result<CreateOutcome> {
        let label = req.label;
        let Some(proposal_id) = self.db.proposals.create_if_absent(req).await? else {
            return Ok(CreateOutcome::Duplicate);
        };

        if label == ProposalLabel::Automatic {
            let run_after = Utc::now()
                + chrono::Duration::from_std(self.send_delay)
                    .map_err(|e| Error::Internal(format!("invalid send delay: {}", e)))?;

            // No automatic retry: a failed dispatch leaves the proposal in
            // `waiting` for manual reconciliation.
            self.db
                .tasks
                .enqueue(
                    TaskType::DispatchProposal,
                    Some(serde_json::to_value(ProposalTaskPayload { proposal_id })?),
                    run_after,
                    0,
                )
                .await?;

            info!(
                subsystem = "proposal",
                op = "create",
                %proposal_id,
                delay_secs = self.send_delay.as_secs(),
                "Automatic proposal created; dispatch scheduled"
            );
        } else {
            info!(
                subsystem = "proposal",
                op = "create",
                %proposal_id,
                "Manual proposal created"
            );
        }

        Ok(CreateOutcome::Created(proposal_id))
    }

    /// Dispatch a proposal whose status still equals `expected`: notify the
    /// employer by email (and best-effort WhatsApp), then mark it sent.
    ///
    /// Any other current status is a silent no-op.
    #[instrument(skip(self))]
    pub async fn dispatch(
        &self,
        proposal_id: Uuid,
        expected: ProposalStatus,
    ) -> Result<DispatchOutcome> {
        let details = self
            .db
            .proposals
            .dispatch_details(proposal_id)
            .await?
            .ok_or(Error::ProposalNotFound(proposal_id))?;

        if details.proposal.status != expected {
            info!(
                subsystem = "proposal",
                op = "dispatch",
                %proposal_id,
                status = %details.proposal.status,
                expected = %expected,
                "Proposal status changed before dispatch; send superseded"
            );
            return Ok(DispatchOutcome::Superseded);
        }

        let template = self.db.templates.default_for(ProposalLabel::Manual).await?;
        let message = match &template {
            Some(tpl) => render(tpl, &employer_context(&details)),
            None => builtin_employer_notification(&details),
        };

        self.notifier
            .send_email(
                &details.employer_email,
                &message.subject,
                &message.body,
                details.applicant_cv_url.as_deref(),
            )
            .await?;

        // Phone channel failure does not block marking the proposal sent
        if let Some(phone) = &details.employer_phone {
            if let Err(e) = self
                .notifier
                .send_whatsapp(
                    phone,
                    &format!("Tienes nueva propuesta para «{}».", details.job_title),
                )
                .await
            {
                warn!(
                    subsystem = "proposal",
                    op = "dispatch",
                    %proposal_id,
                    error = %e,
                    "WhatsApp notification failed; email already delivered"
                );
            }
        }

        self.db.proposals.mark_sent(proposal_id).await?;

        info!(
            subsystem = "proposal",
            op = "dispatch",
            %proposal_id,
            employer_email = %details.employer_email,
            "Proposal dispatched to employer"
        );
        Ok(DispatchOutcome::Sent)
    }

    /// Immediately dispatch a manual proposal that is still `pending`.
    pub async fn send_now(&self, proposal_id: Uuid) -> Result<()> {
        let proposal = self
            .db
            .proposals
            .get(proposal_id)
            .await?
            .ok_or(Error::ProposalNotFound(proposal_id))?;

        if proposal.status != ProposalStatus::Pending {
            return Err(Error::InvalidInput(format!(
                "proposal status is {}, not pending",
                proposal.status
            )));
        }

        match self.dispatch(proposal_id, ProposalStatus::Pending).await? {
            DispatchOutcome::Sent => Ok(()),
            // A concurrent writer moved the status between the read and the
            // dispatch re-check; treat like the delayed path does.
            DispatchOutcome::Superseded => Err(Error::InvalidInput(
                "proposal status changed before dispatch".to_string(),
            )),
        }
    }

    /// Cancel the active proposal for a (job, applicant) pair. Cancelling
    /// while the dispatch task is still queued is what makes that task a
    /// no-op.
    pub async fn cancel(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Uuid> {
        let cancelled = self
            .db
            .proposals
            .cancel_active(job_id, applicant_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound("no active proposal for this job and applicant".to_string())
            })?;

        info!(
            subsystem = "proposal",
            op = "cancel",
            proposal_id = %cancelled,
            "Proposal cancelled"
        );
        Ok(cancelled)
    }
}

/// Template context for employer notifications: `{{employer_name}}`,
/// `{{job_title}}`, `{{applicant_name}}`, `{{applicant_email}}`,
/// `{{cv_url}}`.
pub fn employer_context(details: &ProposalDispatch) -> TemplateContext {
    let mut ctx = TemplateContext::new();
    ctx.insert("employer_name".to_string(), details.employer_name.clone());
    ctx.insert("job_title".to_string(), details.job_title.clone());
    ctx.insert("applicant_name".to_string(), details.applicant_name.clone());
    ctx.insert(
        "applicant_email".to_string(),
        details.applicant_email.clone(),
    );
    ctx.insert(
        "cv_url".to_string(),
        details.applicant_cv_url.clone().unwrap_or_default(),
    );
    ctx
}

/// Fixed employer notification used when no default manual template is
/// configured.
pub fn builtin_employer_notification(details: &ProposalDispatch) -> RenderedMessage {
    RenderedMessage {
        subject: format!("Nueva propuesta para tu oferta: {}", details.job_title),
        body: format!(
            "Hola {},\n\n\
             El postulante {} ha aplicado a tu oferta «{}».\n\
             Contactalo en: {}\n\
             CV: {}\n\n\
             Saludos,\nEl equipo de Bolsa",
            details.employer_name,
            details.applicant_name,
            details.job_title,
            details.applicant_email,
            details.applicant_cv_url.as_deref().unwrap_or("-")
        ),
    }
}

/// The delay automatic proposals wait before dispatch, from configuration
/// or the compiled default.
pub fn default_send_delay() -> Duration {
    Duration::from_secs(defaults::PROPOSAL_SEND_DELAY_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolsa_core::Proposal;
    use chrono::Utc;

    fn details() -> ProposalDispatch {
        ProposalDispatch {
            proposal: Proposal {
                id: Uuid::new_v4(),
                job_id: Uuid::new_v4(),
                applicant_id: Uuid::new_v4(),
                label: ProposalLabel::Automatic,
                status: ProposalStatus::Waiting,
                created_at: Utc::now(),
                sent_at: None,
                cancelled_at: None,
                notes: None,
            },
            job_title: "Dev backend".to_string(),
            applicant_name: "Ana".to_string(),
            applicant_email: "ana@test.example".to_string(),
            applicant_cv_url: Some("https://files.test/cv.pdf".to_string()),
            employer_name: "Marcos".to_string(),
            employer_email: "marcos@empresa.example".to_string(),
            employer_phone: Some("+5492610000000".to_string()),
        }
    }

    #[test]
    fn test_employer_context_keys() {
        let ctx = employer_context(&details());
        assert_eq!(ctx.get("employer_name").unwrap(), "Marcos");
        assert_eq!(ctx.get("job_title").unwrap(), "Dev backend");
        assert_eq!(ctx.get("applicant_name").unwrap(), "Ana");
        assert_eq!(ctx.get("applicant_email").unwrap(), "ana@test.example");
        assert_eq!(ctx.get("cv_url").unwrap(), "https://files.test/cv.pdf");
    }

    #[test]
    fn test_builtin_employer_notification_content() {
        let message = builtin_employer_notification(&details());
        assert!(message.subject.contains("Dev backend"));
        assert!(message.body.contains("Marcos"));
        assert!(message.body.contains("Ana"));
        assert!(message.body.contains("ana@test.example"));
    }

    #[test]
    fn test_builtin_employer_notification_without_cv() {
        let mut d = details();
        d.applicant_cv_url = None;
        let message = builtin_employer_notification(&d);
        assert!(message.body.contains("CV: -"));
    }

    #[test]
    fn test_default_send_delay_is_five_minutes() {
        assert_eq!(default_send_delay(), Duration::from_secs(300));
    }
}
