//! Admin job posting endpoints.
//!
//! Creating or updating a job recomputes its embedding from the text
//! fields and enqueues a match regeneration task; the request itself never
//! waits on the pipeline.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use bolsa_core::{
    defaults, CreateJobRequest, JobRepository, JobTaskPayload, ProposalLabel,
    ProposalRepository, TaskRepository, TaskType, UpdateJobRequest,
};
use bolsa_inference::job_embedding_text;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

/// Query for the job listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub include_expired: bool,
}

/// Body for job creation.
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub source: Option<String>,
    pub label: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Body for job update. Only present fields are written.
#[derive(Debug, Deserialize)]
pub struct UpdateJobBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub label: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

fn parse_label(s: &str) -> Result<ProposalLabel, ApiError> {
    s.parse().map_err(|_| {
        ApiError::BadRequest("label debe ser 'automatic' o 'manual'".to_string())
    })
}

/// `GET /api/admin/jobs`
pub async fn list_jobs(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let offers = state.db.jobs.list(query.include_expired).await?;
    Ok(Json(serde_json::json!({ "offers": offers })))
}

/// `POST /api/admin/jobs`
///
/// Creates a posting, computes its embedding from title + description +
/// requirements, and enqueues the job-side match regeneration. An
/// embedding failure still creates the posting; matching then no-ops
/// until the embedding is recomputed.
pub async fn create_job(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<CreateJobBody>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("title es obligatorio".to_string()))?;
    let description = body
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("description es obligatorio".to_string()))?;
    let owner_id = body
        .owner_id
        .ok_or_else(|| ApiError::BadRequest("owner_id es obligatorio".to_string()))?;
    let label = match body.label.as_deref() {
        Some(s) => parse_label(s)?,
        None => ProposalLabel::Manual,
    };

    let job_id = state
        .db
        .jobs
        .insert(CreateJobRequest {
            title: title.clone(),
            description: description.clone(),
            requirements: body.requirements.clone(),
            expires_at: body.expires_at,
            owner_id,
            source: body.source.unwrap_or_else(|| "admin".to_string()),
            label,
            contact_email: body.contact_email,
            contact_phone: body.contact_phone,
        })
        .await?;

    refresh_job_embedding(&state, job_id, &title, &description, &body.requirements).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Oferta creada",
            "job_id": job_id,
        })),
    ))
}

/// `PUT /api/admin/jobs/:id`
pub async fn update_job(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateJobBody>,
) -> Result<impl IntoResponse, ApiError> {
    let label = body.label.as_deref().map(parse_label).transpose()?;
    let text_changed =
        body.title.is_some() || body.description.is_some() || body.requirements.is_some();

    state
        .db
        .jobs
        .update(
            id,
            UpdateJobRequest {
                title: body.title,
                description: body.description,
                requirements: body.requirements,
                expires_at: body.expires_at.map(Some),
                label,
                contact_email: body.contact_email,
                contact_phone: body.contact_phone,
            },
        )
        .await?;

    if text_changed {
        let job = state
            .db
            .jobs
            .get(id)
            .await?
            .ok_or(bolsa_core::Error::JobNotFound(id))?;
        refresh_job_embedding(&state, id, &job.title, &job.description, &job.requirements)
            .await?;
    }

    Ok(Json(serde_json::json!({ "message": "Oferta actualizada" })))
}

/// `DELETE /api/admin/jobs/:id`
///
/// Cancels the job's active proposals, then removes the posting (matches
/// and proposal rows go with it).
pub async fn delete_job(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = state.db.proposals.cancel_for_job(id).await?;
    state.db.jobs.delete(id).await?;

    Ok(Json(serde_json::json!({
        "message": "Oferta y propuestas eliminadas",
        "cancelled_proposals": cancelled,
    })))
}

/// Recompute a job's embedding and enqueue match regeneration. Failure to
/// embed is logged, not fatal: the posting stays, matching skips it.
async fn refresh_job_embedding(
    state: &AppState,
    job_id: Uuid,
    title: &str,
    description: &str,
    requirements: &str,
) -> Result<(), ApiError> {
    let text = job_embedding_text(title, description, requirements);
    match state.embedding.embed(&text).await {
        Ok(vector) => {
            state.db.jobs.set_embedding(job_id, vector).await?;
            state
                .db
                .tasks
                .enqueue(
                    TaskType::RegenerateJobMatches,
                    Some(serde_json::to_value(JobTaskPayload { job_id }).map_err(
                        bolsa_core::Error::from,
                    )?),
                    Utc::now(),
                    defaults::TASK_MAX_RETRIES,
                )
                .await?;
        }
        Err(e) => {
            warn!(
                %job_id,
                error = %e,
                "Embedding generation failed; job stored without embedding"
            );
        }
    }
    Ok(())
}
