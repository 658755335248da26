use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{finish, required, FieldErrors};

pub const LOAN_KINDS: &[&str] = &["loan", "grant"];
pub const LOAN_STATUSES: &[&str] = &["pending", "approved", "disbursed", "repaid", "rejected"];

/// Amounts are stored as `NUMERIC(14, 2)`.
pub const AMOUNT_SCALE: u32 = 2;
const AMOUNT_INTEGER_DIGITS: u32 = 12;

/// A loan or grant made to a person, a group, or both.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    /// Natural key, unique across loans.
    pub reference: String,
    pub kind: String,
    pub amount: Decimal,
    pub status: String,
    pub person_id: Option<i64>,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanInput {
    #[serde(default)]
    pub reference: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub amount: Option<Decimal>,
    #[serde(default = "default_status")]
    pub status: String,
    pub person_id: Option<i64>,
    pub group_id: Option<i64>,
}

fn default_kind() -> String {
    "loan".to_string()
}

fn default_status() -> String {
    "pending".to_string()
}

impl LoanInput {
    pub fn normalize(mut self) -> Self {
        self.reference = self.reference.trim().to_string();
        self.kind = self.kind.trim().to_string();
        self.status = self.status.trim().to_string();
        self
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "reference", &self.reference);

        if !LOAN_KINDS.contains(&self.kind.as_str()) {
            errors.insert("kind".to_string(), format!("Must be one of: {}", LOAN_KINDS.join(", ")));
        }
        if !LOAN_STATUSES.contains(&self.status.as_str()) {
            errors.insert("status".to_string(), format!("Must be one of: {}", LOAN_STATUSES.join(", ")));
        }
        match self.amount {
            None => {
                errors.insert("amount".to_string(), "This field is required".to_string());
            }
            Some(amount) if amount <= Decimal::ZERO => {
                errors.insert("amount".to_string(), "Must be greater than zero".to_string());
            }
            Some(amount) if amount.normalize().scale() > AMOUNT_SCALE => {
                errors.insert(
                    "amount".to_string(),
                    format!("At most {} decimal places", AMOUNT_SCALE),
                );
            }
            Some(amount) if amount >= Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS)) => {
                errors.insert(
                    "amount".to_string(),
                    format!("Must be less than 10^{}", AMOUNT_INTEGER_DIGITS),
                );
            }
            Some(_) => {}
        }
        if self.person_id.is_none() && self.group_id.is_none() {
            errors.insert(
                "person_id".to_string(),
                "A loan needs a person_id, a group_id, or both".to_string(),
            );
        }

        finish(errors)
    }

    /// Amount after validation has passed.
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}
