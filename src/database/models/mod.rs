mod audit;
mod dashboard;
mod group;
mod loan;
mod person;

use std::collections::BTreeMap;

pub use audit::{AuditEntry, NewAuditEntry};
pub use dashboard::DashboardSummary;
pub use group::{Group, GroupInput};
pub use loan::{Loan, LoanInput, LOAN_KINDS, LOAN_STATUSES};
pub use person::{Person, PersonInput};

/// Field name → problem, returned to the client in a 400.
pub type FieldErrors = BTreeMap<String, String>;

fn required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), "This field is required".to_string());
    }
}

fn finish(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Trim and drop empty optional strings.
fn clean(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
}
