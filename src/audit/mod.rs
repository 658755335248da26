//! Audit trail for mutating operations.
//!
//! Handlers call [`AuditRecorder::record`] exactly once, after their store
//! write has succeeded. The append is a separate write from the mutation and
//! is best-effort: a failure is logged and the caller's response is unchanged.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::database::{AuditEntry, AuditSink, DatabaseError, Group, Loan, NewAuditEntry, Person};

#[derive(Debug, Error)]
#[error("audit write failed: {0}")]
pub struct AuditWriteFailure(#[from] DatabaseError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Change::Added => "Added",
            Change::Updated => "Updated",
            Change::Deleted => "Deleted",
        })
    }
}

/// Action label plus a detail string naming the affected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: String,
    pub details: String,
}

impl AuditEvent {
    pub fn person(change: Change, person: &Person) -> Self {
        Self {
            action: format!("{} Person", change),
            details: format!("Person {} (National ID: {})", person.full_name, person.national_id),
        }
    }

    pub fn group(change: Change, group: &Group) -> Self {
        Self {
            action: format!("{} Group", change),
            details: format!("Group {} (Registration No: {})", group.name, group.registration_number),
        }
    }

    pub fn loan(change: Change, loan: &Loan) -> Self {
        Self {
            action: format!("{} Loan", change),
            details: format!(
                "Loan {} ({} of {}, status {})",
                loan.reference, loan.kind, loan.amount, loan.status
            ),
        }
    }
}

#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append and report the outcome.
    pub async fn try_record(&self, event: AuditEvent, origin: &str) -> Result<AuditEntry, AuditWriteFailure> {
        let entry = self
            .sink
            .append(NewAuditEntry {
                action: event.action,
                details: event.details,
                ip_address: origin.to_string(),
            })
            .await?;
        Ok(entry)
    }

    /// Best-effort append. Failures are logged server-side only.
    pub async fn record(&self, event: AuditEvent, origin: &str) {
        let action = event.action.clone();
        match self.try_record(event, origin).await {
            Ok(entry) => tracing::debug!("Audit entry {} written: {}", entry.id, entry.action),
            Err(e) => tracing::error!(action = %action, origin = %origin, "{}", e),
        }
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditEntry>, DatabaseError> {
        self.sink.recent(limit).await
    }
}
