//! HTTP error mapping.
//!
//! Every error leaves the API as JSON (`{"error": …}`) so the front-end can
//! always render failure text. Internal errors are logged with their cause
//! but surface with a generic message; store and transport details never
//! reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

/// API-level error with an HTTP status.
#[derive(Debug)]
pub enum ApiError {
    Internal(bolsa_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
}

impl From<bolsa_core::Error> for ApiError {
    fn from(err: bolsa_core::Error) -> Self {
        use bolsa_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::JobNotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            Error::CandidateNotFound(id) => {
                ApiError::NotFound(format!("Candidate {} not found", id))
            }
            Error::ProposalNotFound(id) => {
                ApiError::NotFound(format!("Proposal {} not found", id))
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = bolsa_core::Error::NotFound("token".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_job_not_found_maps_to_404() {
        let err: ApiError = bolsa_core::Error::JobNotFound(Uuid::nil()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = bolsa_core::Error::InvalidInput("bad label".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_database_error_maps_to_internal() {
        let err: ApiError = bolsa_core::Error::Internal("boom".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_internal_response_hides_detail() {
        let err: ApiError = bolsa_core::Error::Internal("secret detail".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
