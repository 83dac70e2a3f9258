//! Apply-token resolution endpoint.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::AppState;

/// `GET /api/job/apply/:token`
///
/// Consumes a single-use apply token: creates the proposal (once) and marks
/// the match applied. A second click with the same token, or a token whose
/// match moved on through a race, gets 404. The response is always JSON so
/// the front-end page can render success or failure text.
pub async fn apply_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state.engine.apply(&token).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Postulación registrada",
        "job_id": application.job_id,
    })))
}
