//! Proposal endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bolsa_core::{CreateProposalRequest, ProposalLabel, ProposalRepository};
use bolsa_match::CreateOutcome;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

/// Body for `POST /api/proposals`. Fields arrive optional so a missing one
/// is a 400 with a message, not a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateProposalBody {
    pub job_id: Option<Uuid>,
    pub applicant_id: Option<Uuid>,
    pub label: Option<String>,
}

/// `POST /api/proposals`
///
/// Creates a proposal. Automatic proposals start `waiting` and schedule a
/// delayed dispatch; manual proposals start `pending`. A duplicate pair is
/// reported, not an error.
pub async fn create_proposal(
    State(state): State<AppState>,
    Json(body): Json<CreateProposalBody>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = body
        .job_id
        .ok_or_else(|| ApiError::BadRequest("job_id es obligatorio".to_string()))?;
    let applicant_id = body
        .applicant_id
        .ok_or_else(|| ApiError::BadRequest("applicant_id es obligatorio".to_string()))?;
    let label: ProposalLabel = body
        .label
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("label es obligatorio".to_string()))?
        .parse()
        .map_err(|_| {
            ApiError::BadRequest("label debe ser 'automatic' o 'manual'".to_string())
        })?;

    let outcome = state
        .scheduler
        .create(CreateProposalRequest {
            job_id,
            applicant_id,
            label,
        })
        .await?;

    match outcome {
        CreateOutcome::Created(proposal_id) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Propuesta creada",
                "proposal_id": proposal_id,
            })),
        )),
        CreateOutcome::Duplicate => Ok((
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Ya existe una propuesta para este usuario y oferta",
            })),
        )),
    }
}

/// Body for `POST /api/proposals/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelProposalBody {
    pub job_id: Option<Uuid>,
    pub applicant_id: Option<Uuid>,
}

/// `POST /api/proposals/cancel`
///
/// Cancels the active proposal for a (job, applicant) pair. Cancelling
/// inside the delay window is what supersedes a scheduled dispatch.
pub async fn cancel_proposal(
    State(state): State<AppState>,
    Json(body): Json<CancelProposalBody>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = body
        .job_id
        .ok_or_else(|| ApiError::BadRequest("job_id es obligatorio".to_string()))?;
    let applicant_id = body
        .applicant_id
        .ok_or_else(|| ApiError::BadRequest("applicant_id es obligatorio".to_string()))?;

    state.scheduler.cancel(job_id, applicant_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Postulación cancelada",
    })))
}

/// `GET /api/admin/proposals`
pub async fn list_proposals(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let proposals = state.db.proposals.list_admin().await?;
    Ok(Json(serde_json::json!({ "proposals": proposals })))
}

/// `POST /api/admin/proposals/:id/send`
///
/// Immediately dispatches a manual proposal still in `pending`.
pub async fn send_proposal(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.scheduler.send_now(id).await?;
    Ok(Json(serde_json::json!({
        "message": "Propuesta enviada correctamente",
    })))
}
