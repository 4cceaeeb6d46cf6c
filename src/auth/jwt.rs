//! JWT issue and validation.

use crate::error::{AppError, AppResult};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub iat: i64,
    pub exp: i64,
    pub authorities: Vec<String>,
}

/// Identity recovered from a validated token.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub user_id: i64,
    pub authorities: Vec<String>,
}

#[derive(Clone)]
pub struct JwtSecret {
    secret: String,
    expiry: Duration,
}

impl JwtSecret {
    pub fn new(secret: String, expiry: Duration) -> Self {
        Self { secret, expiry }
    }

    pub fn issue(&self, user_id: i64, authorities: Vec<String>) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.expiry.as_secs() as i64,
            authorities,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        Ok(token)
    }

    /// Rejects expired, mis-signed, and malformed tokens.
    pub fn validate(&self, token: &str) -> AppResult<TokenIdentity> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        let user_id: i64 = data
            .claims
            .sub
            .parse()
            .map_err(|_| AppError::Jwt("invalid subject claim".to_string()))?;
        Ok(TokenIdentity {
            user_id,
            authorities: data.claims.authorities,
        })
    }
}
