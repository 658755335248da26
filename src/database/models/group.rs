use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{clean, finish, required, FieldErrors};

/// A registered self-help or community group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub registration_number: String,
    pub ward: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registration_number: String,
    pub ward: Option<String>,
}

impl GroupInput {
    pub fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.registration_number = self.registration_number.trim().to_string();
        clean(&mut self.ward);
        self
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "name", &self.name);
        required(&mut errors, "registration_number", &self.registration_number);
        finish(errors)
    }
}
