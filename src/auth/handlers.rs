//! Auth HTTP handlers: register, login, me.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AuthOutcome, AuthService, NewUser};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;
use crate::models::User;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Shared response body for register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        let roles = outcome.user.authorities();
        let user = outcome.user;
        Self {
            token: outcome.token,
            token_type: "Bearer".to_string(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            roles,
            created_at: user.created_at,
        }
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outcome = AuthService::register(
        state.db(),
        state.jwt_secret(),
        NewUser {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            phone_number: body.phone_number,
            password: body.password,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    body.validate()
        .map_err(|_| AppError::InvalidCredentials)?;

    let outcome =
        AuthService::login(state.db(), state.jwt_secret(), &body.email, &body.password).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        let roles = user.authorities();
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            roles,
            created_at: user.created_at,
        }
    }
}

/// GET /auth/me — the user behind the presented bearer token.
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = AuthService::load_user(state.db(), identity.user_id).await?;
    Ok(Json(user.into()))
}
