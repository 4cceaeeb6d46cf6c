//! Auth middleware: JWT extractor for protected routes.

use axum::http::header::AUTHORIZATION;

use crate::auth::TokenIdentity;
use crate::error::AppError;
use crate::handlers::http::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor: authenticated identity from a JWT bearer token. The identity
/// travels as a request argument; there is no ambient security context.
#[derive(Clone, Debug)]
pub struct AuthUser(pub TokenIdentity);

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix(BEARER_PREFIX));
        let token = auth
            .ok_or_else(|| AppError::Jwt("Missing or invalid Authorization header".to_string()))?;
        let identity = state.jwt_secret().validate(token)?;
        Ok(AuthUser(identity))
    }
}
