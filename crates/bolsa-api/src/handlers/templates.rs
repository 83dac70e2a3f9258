//! Admin proposal-template endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use bolsa_core::{
    CreateTemplateRequest, ProposalLabel, TemplateRepository, UpdateTemplateRequest,
};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

/// Body for template creation. `kind` also accepts the legacy field name
/// `type`.
#[derive(Debug, Deserialize)]
pub struct CreateTemplateBody {
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Body for template update. Only present fields are written.
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateBody {
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

fn parse_kind(s: &str) -> Result<ProposalLabel, ApiError> {
    s.parse().map_err(|_| {
        ApiError::BadRequest("type debe ser 'automatic' o 'manual'".to_string())
    })
}

fn required_nonempty(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{} es obligatorio", field))),
    }
}

/// `GET /api/admin/templates`
pub async fn list_templates(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = state.db.templates.list().await?;
    Ok(Json(serde_json::json!({ "templates": templates })))
}

/// `POST /api/admin/templates`
pub async fn create_template(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<CreateTemplateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required_nonempty(body.name, "name")?;
    let kind = parse_kind(&required_nonempty(body.kind, "type")?)?;
    let subject = required_nonempty(body.subject, "subject")?;
    let tpl_body = required_nonempty(body.body, "body")?;

    let id = state
        .db
        .templates
        .create(CreateTemplateRequest {
            name,
            kind,
            subject,
            body: tpl_body,
        })
        .await?;

    let template = state.db.templates.get(id).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "template": template })),
    ))
}

/// `PUT /api/admin/templates/:id`
pub async fn update_template(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTemplateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = body.kind.as_deref().map(parse_kind).transpose()?;

    state
        .db
        .templates
        .update(
            id,
            UpdateTemplateRequest {
                name: body.name,
                kind,
                subject: body.subject,
                body: body.body,
            },
        )
        .await?;

    let template = state.db.templates.get(id).await?;
    Ok(Json(serde_json::json!({ "template": template })))
}

/// `DELETE /api/admin/templates/:id`
pub async fn delete_template(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.templates.delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Plantilla eliminada" })))
}

/// `POST /api/admin/templates/:id/set-default`
///
/// Marks the template as default for its kind; the previous default for
/// that kind is cleared in the same transaction. The other kind's default
/// is untouched.
pub async fn set_default_template(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.templates.set_default(id).await?;
    Ok(Json(serde_json::json!({
        "message": "Plantilla establecida como default",
    })))
}
