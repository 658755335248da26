use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{clean, finish, required, FieldErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: i64,
    pub full_name: String,
    /// Natural key, unique across persons.
    pub national_id: String,
    pub phone: Option<String>,
    pub ward: Option<String>,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for POST and PUT on `/api/persons`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub national_id: String,
    pub phone: Option<String>,
    pub ward: Option<String>,
    pub group_id: Option<i64>,
}

impl PersonInput {
    pub fn normalize(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.national_id = self.national_id.trim().to_string();
        clean(&mut self.phone);
        clean(&mut self.ward);
        self
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "full_name", &self.full_name);
        required(&mut errors, "national_id", &self.national_id);
        finish(errors)
    }
}
