//! Admin authentication.
//!
//! Admin-only routes take an [`AdminUser`] extractor argument: a bearer
//! token signed HS256 with the configured secret, carrying a non-empty
//! `sub` claim.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: Option<usize>,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        verify_bearer(header, &state.jwt_secret)
    }
}

/// Validate a bearer Authorization header against the admin secret.
fn verify_bearer(header: Option<&str>, secret: &str) -> Result<AdminUser, ApiError> {
    let header =
        header.ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".into()))?;

    let mut validation = Validation::new(Algorithm::HS256);
    // Admin tokens issued by the auth service may omit exp
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| ApiError::Unauthorized(format!("invalid token: {err}")))?;

    if data.claims.sub.is_empty() {
        return Err(ApiError::Unauthorized("token has no subject".into()));
    }

    Ok(AdminUser {
        subject: data.claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    const SECRET: &str = "test-secret";

    fn token(sub: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            exp: 4_000_000_000, // far future
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_bearer_token() {
        let header = format!("Bearer {}", token("admin@bolsa.example"));
        let user = verify_bearer(Some(&header), SECRET).unwrap();
        assert_eq!(user.subject, "admin@bolsa.example");
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(matches!(
            verify_bearer(None, SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_non_bearer_rejected() {
        assert!(matches!(
            verify_bearer(Some("Basic abc"), SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = format!("Bearer {}", token("admin"));
        assert!(matches!(
            verify_bearer(Some(&header), "other-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let header = format!("Bearer {}", token(""));
        assert!(matches!(
            verify_bearer(Some(&header), SECRET),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
