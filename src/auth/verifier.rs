use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::roles::Role;
use super::Claims;

/// Reasons a request fails authentication. Callers only ever see one
/// generic message for both; the variant and detail go to the logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    Unauthenticated,

    #[error("credential rejected: {0}")]
    InvalidCredential(String),
}

/// Identity attached to a request after its token was verified.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
    pub role: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    /// The role as a known enum value, if it is one.
    pub fn known_role(&self) -> Option<Role> {
        Role::from_wire(&self.role)
    }
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify the raw `Authorization` header value.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let header = header.ok_or(AuthError::Unauthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidCredential("expected Bearer token".to_string()))?;

        self.verify(token)
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        let claims = data.claims;

        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0)
            .ok_or_else(|| AuthError::InvalidCredential("iat out of range".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::InvalidCredential("exp out of range".to_string()))?;

        Ok(Principal {
            subject: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}
