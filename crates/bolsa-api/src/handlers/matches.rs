//! Admin match endpoints.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use bolsa_core::{defaults, MatchRepository};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/admin/matches`
///
/// Matches at or above the invitation threshold, newest-sent-first, with
/// the job title and candidate email the panel displays.
pub async fn list_matches(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let matches = state
        .db
        .matches
        .list_admin(defaults::MATCH_SCORE_THRESHOLD)
        .await?;
    Ok(Json(serde_json::json!({ "matches": matches })))
}

/// `POST /api/admin/matches/:id/resend`
///
/// Re-renders and re-sends the notification for one match. The apply token
/// is left untouched, so links already distributed keep working.
pub async fn resend_match(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.resend(id).await?;
    Ok(Json(serde_json::json!({ "message": "reenviado" })))
}

/// `GET /api/admin/matches/preview/job/:id`
pub async fn preview_job_matches(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let matches = state
        .db
        .matches
        .preview_for_job(id, defaults::MATCH_PREVIEW_LIMIT)
        .await?;
    Ok(Json(serde_json::json!({ "matches": matches })))
}

/// `GET /api/admin/matches/preview/candidate/:id`
pub async fn preview_candidate_matches(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let matches = state
        .db
        .matches
        .preview_for_candidate(id, defaults::MATCH_PREVIEW_LIMIT)
        .await?;
    Ok(Json(serde_json::json!({ "matches": matches })))
}
