pub mod policy;
pub mod roles;
pub mod verifier;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use policy::{allowed_roles, authorize, Action, Denied, Resource};
pub use roles::Role;
pub use verifier::{AuthError, Principal, TokenVerifier};

/// Session token claims. `role` stays a raw string so that unknown roles
/// reach the policy gate and are denied there like any other mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, role: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            role: role.into(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token lifetime: {0} hours")]
    InvalidLifetime(u64),
}

/// Longest lifetime the issuer accepts.
pub const MAX_TOKEN_LIFETIME_HOURS: u64 = 24 * 366;

/// Mints session tokens. The login flow lives outside this service; this is
/// used by the `issue-token` CLI command and the test suites.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime_hours: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        if lifetime_hours == 0 || lifetime_hours > MAX_TOKEN_LIFETIME_HOURS {
            return Err(JwtError::InvalidLifetime(lifetime_hours));
        }
        let lifetime = i64::try_from(lifetime_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or(JwtError::InvalidLifetime(lifetime_hours))?;
        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    pub fn issue(&self, subject: &str, role: &str) -> Result<String, JwtError> {
        self.sign(&Claims::new(subject, role, self.lifetime))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }
}
