//! Auth orchestrator: role bootstrap, registration, login.

use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::JwtSecret;
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{RoleName, User};

/// Validated registration input (the entry layer has already checked
/// presence and format).
#[derive(Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
}

/// Result of a successful registration or login: the authenticated user
/// plus a freshly issued bearer token. Never persisted.
#[derive(Debug)]
pub struct AuthOutcome {
    pub token: String,
    pub user: User,
}

pub struct AuthService;

impl AuthService {
    /// Ensure the three canonical roles exist. Idempotent; safe to run on
    /// every startup. The caller decides whether a failure is fatal (main
    /// logs and continues, matching the observed behavior).
    pub async fn bootstrap_roles(pool: &DbPool) -> AppResult<()> {
        info!("initializing default roles");
        for role in RoleName::CANONICAL {
            if !db::role_exists_by_name(pool, role).await? {
                db::role_insert(pool, role).await?;
                info!(role = role.as_authority(), "created role");
            }
        }
        info!("role initialization completed");
        Ok(())
    }

    pub async fn register(pool: &DbPool, jwt: &JwtSecret, req: NewUser) -> AppResult<AuthOutcome> {
        info!(email = %req.email, "registering new user");

        if db::user_exists_by_email(pool, &req.email).await? {
            return Err(AppError::DuplicateEmail);
        }
        if let Some(phone) = req.phone_number.as_deref() {
            if db::user_exists_by_phone(pool, phone).await? {
                return Err(AppError::DuplicatePhone);
            }
        }

        let password_hash = hash_password(&req.password)?;

        // Insert and role attach are one transaction: if the default role is
        // missing (failed bootstrap) or the attach errors, the user row rolls
        // back instead of lingering without roles and blocking retries with
        // a duplicate-email error.
        let mut tx = pool.begin().await?;
        let row = db::user_insert(
            &mut tx,
            &req.first_name,
            &req.last_name,
            &req.email,
            req.phone_number.as_deref(),
            &password_hash,
        )
        .await?;

        let role = db::role_find_by_name(&mut tx, RoleName::User)
            .await?
            .ok_or(AppError::RoleMissing)?;
        db::user_attach_role(&mut tx, row.id, role.id).await?;
        tx.commit().await?;
        info!(user_id = row.id, "user registered");

        // Authenticate the fresh credentials the same way login does. This
        // re-checks the password we just hashed; kept to match the original
        // registration flow.
        let user = Self::authenticate(pool, &req.email, &req.password).await?;
        let token = jwt.issue(user.id, user.authorities())?;

        Ok(AuthOutcome { token, user })
    }

    pub async fn login(
        pool: &DbPool,
        jwt: &JwtSecret,
        email: &str,
        password: &str,
    ) -> AppResult<AuthOutcome> {
        info!(email = %email, "login attempt");

        let user = Self::authenticate(pool, email, password).await?;
        let token = jwt.issue(user.id, user.authorities())?;

        info!(user_id = user.id, "login successful");
        Ok(AuthOutcome { token, user })
    }

    /// Credential check. Unknown email and wrong password collapse into the
    /// same error so callers cannot enumerate accounts.
    async fn authenticate(pool: &DbPool, email: &str, password: &str) -> AppResult<User> {
        let row = db::user_find_by_email(pool, email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &row.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let roles = db::role_names_for_user(pool, row.id).await?;
        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone_number: row.phone_number,
            password_hash: row.password_hash,
            enabled: row.enabled,
            created_at: row.created_at,
            roles,
        })
    }

    /// Load a user by the id recovered from a bearer token.
    pub async fn load_user(pool: &DbPool, user_id: i64) -> AppResult<User> {
        let row = db::user_get_by_id(pool, user_id)
            .await?
            .ok_or_else(|| AppError::Jwt("unknown subject".to_string()))?;
        let roles = db::role_names_for_user(pool, row.id).await?;
        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone_number: row.phone_number,
            password_hash: row.password_hash,
            enabled: row.enabled,
            created_at: row.created_at,
            roles,
        })
    }
}
