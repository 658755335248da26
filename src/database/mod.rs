pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{
    AuditEntry, DashboardSummary, Group, GroupInput, Loan, LoanInput, NewAuditEntry, Person, PersonInput,
};
pub use postgres::PgStore;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Unique natural key already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A value the schema refuses (check constraint, numeric overflow).
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Resource storage injected into every handler through `AppState`.
///
/// `update_*` and `delete_*` return `Ok(None)` when the id does not exist so
/// handlers can answer 404 without writing an audit entry. `delete_*` hands
/// back the removed row for the audit detail string.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError>;
    async fn get_person(&self, id: i64) -> Result<Option<Person>, DatabaseError>;
    async fn create_person(&self, input: &PersonInput) -> Result<Person, DatabaseError>;
    async fn update_person(&self, id: i64, input: &PersonInput) -> Result<Option<Person>, DatabaseError>;
    async fn delete_person(&self, id: i64) -> Result<Option<Person>, DatabaseError>;

    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError>;
    async fn get_group(&self, id: i64) -> Result<Option<Group>, DatabaseError>;
    async fn create_group(&self, input: &GroupInput) -> Result<Group, DatabaseError>;
    async fn update_group(&self, id: i64, input: &GroupInput) -> Result<Option<Group>, DatabaseError>;
    async fn delete_group(&self, id: i64) -> Result<Option<Group>, DatabaseError>;

    async fn list_loans(&self) -> Result<Vec<Loan>, DatabaseError>;
    async fn get_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError>;
    async fn create_loan(&self, input: &LoanInput) -> Result<Loan, DatabaseError>;
    async fn update_loan(&self, id: i64, input: &LoanInput) -> Result<Option<Loan>, DatabaseError>;
    async fn delete_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError>;

    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError>;
}

/// Append-only audit log. Entries are never updated or removed.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DatabaseError>;

    /// Most recent entries first.
    async fn recent(&self, limit: i64) -> Result<Vec<AuditEntry>, DatabaseError>;
}
