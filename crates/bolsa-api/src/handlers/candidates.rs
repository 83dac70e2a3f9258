//! Admin candidate endpoints.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use bolsa_core::{
    defaults, CandidateRepository, CandidateTaskPayload, TaskRepository, TaskType,
};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

/// Body for a résumé update.
#[derive(Debug, Deserialize)]
pub struct UpdateResumeBody {
    pub cv_url: Option<String>,
    /// Profile summary produced by the external extraction pipeline; when
    /// present the candidate's embedding is recomputed from it.
    pub description: Option<String>,
}

/// `POST /api/admin/candidates/:id/resume`
///
/// Records a new résumé and refreshes the candidate's matches. The
/// candidate-side regeneration sends no invitations; it only refreshes
/// pool state for job owners to review.
pub async fn update_resume(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateResumeBody>,
) -> Result<impl IntoResponse, ApiError> {
    let cv_url = body
        .cv_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("cv_url es obligatorio".to_string()))?;

    state
        .db
        .candidates
        .set_resume(id, &cv_url, body.description.as_deref())
        .await?;

    if let Some(description) = &body.description {
        match state.embedding.embed(description).await {
            Ok(vector) => {
                state.db.candidates.set_embedding(id, vector).await?;
                state
                    .db
                    .tasks
                    .enqueue(
                        TaskType::RegenerateCandidateMatches,
                        Some(
                            serde_json::to_value(CandidateTaskPayload { candidate_id: id })
                                .map_err(bolsa_core::Error::from)?,
                        ),
                        Utc::now(),
                        defaults::TASK_MAX_RETRIES,
                    )
                    .await?;
            }
            Err(e) => {
                warn!(
                    candidate_id = %id,
                    error = %e,
                    "Embedding generation failed; résumé stored without new embedding"
                );
            }
        }
    }

    Ok(Json(serde_json::json!({
        "message": "CV actualizado",
    })))
}
