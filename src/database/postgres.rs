use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool, Row};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use super::models::{
    AuditEntry, DashboardSummary, Group, GroupInput, Loan, LoanInput, NewAuditEntry, Person, PersonInput,
};
use super::{AuditSink, DatabaseError, Store};
use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

const PERSON_COLUMNS: &str = "id, full_name, national_id, phone, ward, group_id, created_at, updated_at";
const GROUP_COLUMNS: &str = "id, name, registration_number, ward, created_at, updated_at";
const LOAN_COLUMNS: &str = "id, reference, kind, amount, status, person_id, group_id, created_at, updated_at";

/// Postgres-backed store. Tables are described in `sql/schema.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create missing tables and indexes. Every statement is `IF NOT EXISTS`.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        self.pool.execute(SCHEMA).await?;
        info!("Database schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Translate constraint violations into the variants handlers care about.
fn write_error(err: sqlx::Error) -> DatabaseError {
    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("constraint").to_string();
        match db_err.code().as_deref() {
            Some("23505") => return DatabaseError::Conflict(format!("duplicate value violates {}", constraint)),
            Some("23503") => return DatabaseError::InvalidReference(constraint),
            Some("23514") => return DatabaseError::InvalidValue(format!("violates {}", constraint)),
            Some("22003") => return DatabaseError::InvalidValue(db_err.message().to_string()),
            _ => {}
        }
    }
    DatabaseError::Sqlx(err)
}

/// Deletes blocked by `ON DELETE RESTRICT` surface as a conflict, not a bad reference.
fn delete_error(err: sqlx::Error) -> DatabaseError {
    match write_error(err) {
        DatabaseError::InvalidReference(constraint) => {
            DatabaseError::Conflict(format!("row is still referenced by {}", constraint))
        }
        other => other,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError> {
        let sql = format!("SELECT {} FROM persons ORDER BY id", PERSON_COLUMNS);
        Ok(sqlx::query_as::<_, Person>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_person(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        let sql = format!("SELECT {} FROM persons WHERE id = $1", PERSON_COLUMNS);
        Ok(sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_person(&self, input: &PersonInput) -> Result<Person, DatabaseError> {
        let sql = format!(
            "INSERT INTO persons (full_name, national_id, phone, ward, group_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            PERSON_COLUMNS
        );
        sqlx::query_as::<_, Person>(&sql)
            .bind(&input.full_name)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.ward)
            .bind(input.group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn update_person(&self, id: i64, input: &PersonInput) -> Result<Option<Person>, DatabaseError> {
        let sql = format!(
            "UPDATE persons
             SET full_name = $2, national_id = $3, phone = $4, ward = $5, group_id = $6, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PERSON_COLUMNS
        );
        sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .bind(&input.full_name)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.ward)
            .bind(input.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn delete_person(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        let sql = format!("DELETE FROM persons WHERE id = $1 RETURNING {}", PERSON_COLUMNS);
        sqlx::query_as::<_, Person>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(delete_error)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError> {
        let sql = format!("SELECT {} FROM beneficiary_groups ORDER BY id", GROUP_COLUMNS);
        Ok(sqlx::query_as::<_, Group>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        let sql = format!("SELECT {} FROM beneficiary_groups WHERE id = $1", GROUP_COLUMNS);
        Ok(sqlx::query_as::<_, Group>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_group(&self, input: &GroupInput) -> Result<Group, DatabaseError> {
        let sql = format!(
            "INSERT INTO beneficiary_groups (name, registration_number, ward)
             VALUES ($1, $2, $3)
             RETURNING {}",
            GROUP_COLUMNS
        );
        sqlx::query_as::<_, Group>(&sql)
            .bind(&input.name)
            .bind(&input.registration_number)
            .bind(&input.ward)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn update_group(&self, id: i64, input: &GroupInput) -> Result<Option<Group>, DatabaseError> {
        let sql = format!(
            "UPDATE beneficiary_groups
             SET name = $2, registration_number = $3, ward = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            GROUP_COLUMNS
        );
        sqlx::query_as::<_, Group>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.registration_number)
            .bind(&input.ward)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn delete_group(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        let sql = format!("DELETE FROM beneficiary_groups WHERE id = $1 RETURNING {}", GROUP_COLUMNS);
        sqlx::query_as::<_, Group>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(delete_error)
    }

    async fn list_loans(&self) -> Result<Vec<Loan>, DatabaseError> {
        let sql = format!("SELECT {} FROM loans ORDER BY id", LOAN_COLUMNS);
        Ok(sqlx::query_as::<_, Loan>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError> {
        let sql = format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS);
        Ok(sqlx::query_as::<_, Loan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_loan(&self, input: &LoanInput) -> Result<Loan, DatabaseError> {
        let sql = format!(
            "INSERT INTO loans (reference, kind, amount, status, person_id, group_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            LOAN_COLUMNS
        );
        sqlx::query_as::<_, Loan>(&sql)
            .bind(&input.reference)
            .bind(&input.kind)
            .bind(input.amount_or_zero())
            .bind(&input.status)
            .bind(input.person_id)
            .bind(input.group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn update_loan(&self, id: i64, input: &LoanInput) -> Result<Option<Loan>, DatabaseError> {
        let sql = format!(
            "UPDATE loans
             SET reference = $2, kind = $3, amount = $4, status = $5, person_id = $6, group_id = $7,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            LOAN_COLUMNS
        );
        sqlx::query_as::<_, Loan>(&sql)
            .bind(id)
            .bind(&input.reference)
            .bind(&input.kind)
            .bind(input.amount_or_zero())
            .bind(&input.status)
            .bind(input.person_id)
            .bind(input.group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)
    }

    async fn delete_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError> {
        let sql = format!("DELETE FROM loans WHERE id = $1 RETURNING {}", LOAN_COLUMNS);
        sqlx::query_as::<_, Loan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(delete_error)
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError> {
        let totals = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM persons) AS person_count,
                (SELECT COUNT(*) FROM beneficiary_groups) AS group_count,
                (SELECT COUNT(*) FROM loans) AS loan_count,
                (SELECT COALESCE(SUM(amount), 0) FROM loans) AS total_loan_amount",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_status = sqlx::query("SELECT status, COUNT(*) AS n FROM loans GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut loans_by_status = BTreeMap::new();
        for row in by_status {
            loans_by_status.insert(row.try_get::<String, _>("status")?, row.try_get::<i64, _>("n")?);
        }

        Ok(DashboardSummary {
            persons: totals.try_get("person_count")?,
            groups: totals.try_get("group_count")?,
            loans: totals.try_get("loan_count")?,
            total_loan_amount: totals.try_get::<Decimal, _>("total_loan_amount")?,
            loans_by_status,
        })
    }
}

#[async_trait]
impl AuditSink for PgStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DatabaseError> {
        let row = sqlx::query_as::<_, AuditEntry>(
            "INSERT INTO audit_logs (action, details, ip_address)
             VALUES ($1, $2, $3)
             RETURNING id, action, details, ip_address, created_at",
        )
        .bind(&entry.action)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditEntry>, DatabaseError> {
        let rows = sqlx::query_as::<_, AuditEntry>(
            "SELECT id, action, details, ip_address, created_at
             FROM audit_logs
             ORDER BY created_at DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
