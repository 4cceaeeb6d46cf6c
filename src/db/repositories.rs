//! Repositories: users, roles, and the user_roles join table.

use crate::error::{AppError, AppResult};
use crate::models::RoleName;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;

// Constraint names from migrations/0001_init.sql; used to map concurrent
// duplicate inserts onto the right client-facing error.
const UNIQ_EMAIL: &str = "users_email_key";
const UNIQ_PHONE: &str = "users_phone_number_key";

// ---- Users ----

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Runs on a caller-supplied connection so registration can wrap the insert
/// and the role attach in one transaction; an error after the insert rolls
/// the user row back instead of stranding it without roles.
pub async fn user_insert(
    conn: &mut sqlx::PgConnection,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone_number: Option<&str>,
    password_hash: &str,
) -> AppResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (first_name, last_name, email, phone_number, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, first_name, last_name, email, phone_number, password_hash, enabled, created_at
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(phone_number)
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(map_unique_violation)?;
    Ok(row)
}

/// The store is the system of record for uniqueness: when two registrations
/// race, the second insert loses on the constraint and surfaces as the same
/// duplicate error the pre-check would have produced.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    let constraint = match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            db_err.constraint().map(str::to_owned)
        }
        _ => None,
    };
    match constraint.as_deref() {
        Some(UNIQ_EMAIL) => AppError::DuplicateEmail,
        Some(UNIQ_PHONE) => AppError::DuplicatePhone,
        _ => AppError::Db(e),
    }
}

pub async fn user_exists_by_email(pool: &DbPool, email: &str) -> AppResult<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn user_exists_by_phone(pool: &DbPool, phone_number: &str) -> AppResult<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE phone_number = $1)")
            .bind(phone_number)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn user_find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, phone_number, password_hash, enabled, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_get_by_id(pool: &DbPool, id: i64) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, phone_number, password_hash, enabled, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ---- Roles ----

#[derive(Debug, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

pub async fn role_find_by_name(
    conn: &mut sqlx::PgConnection,
    name: RoleName,
) -> AppResult<Option<RoleRow>> {
    let row = sqlx::query_as::<_, RoleRow>(
        "SELECT id, name, description FROM roles WHERE name = $1",
    )
    .bind(name.as_authority())
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn role_exists_by_name(pool: &DbPool, name: RoleName) -> AppResult<bool> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
        .bind(name.as_authority())
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Insert a canonical role if absent. `ON CONFLICT DO NOTHING` keeps the
/// bootstrap idempotent even when two instances start at once.
pub async fn role_insert(pool: &DbPool, name: RoleName) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO roles (name, description)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name.as_authority())
    .bind(name.description())
    .execute(pool)
    .await?;
    Ok(())
}

// ---- User roles (many-to-many) ----

pub async fn user_attach_role(
    conn: &mut sqlx::PgConnection,
    user_id: i64,
    role_id: i64,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, role_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn role_names_for_user(pool: &DbPool, user_id: i64) -> AppResult<Vec<RoleName>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT r.name
        FROM roles r
        JOIN user_roles ur ON ur.role_id = r.id
        WHERE ur.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    // Rows outside the canonical set would indicate manual table edits;
    // skip them rather than failing the whole login.
    Ok(rows
        .into_iter()
        .filter_map(|(name,)| RoleName::parse(&name))
        .collect())
}
