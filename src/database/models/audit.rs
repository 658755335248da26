use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One completed mutating action. Never modified once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub details: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

/// What a handler supplies; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub action: String,
    pub details: String,
    pub ip_address: String,
}
