//! User domain view: a persisted user together with its role set.

use chrono::{DateTime, Utc};

use super::RoleName;

/// A user as seen by the auth flow. `password_hash` is the argon2 PHC string;
/// plaintext passwords never appear here.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<RoleName>,
}

impl User {
    /// Project the role set into a flat, sorted set of authority strings.
    /// Pure; used both for response bodies and for the token's claim.
    pub fn authorities(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .roles
            .iter()
            .map(|r| r.as_authority().to_string())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
