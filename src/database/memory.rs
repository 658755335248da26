use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::{
    AuditEntry, DashboardSummary, Group, GroupInput, Loan, LoanInput, NewAuditEntry, Person, PersonInput,
};
use super::{AuditSink, DatabaseError, Store};

#[derive(Default)]
struct Tables {
    next_id: i64,
    persons: BTreeMap<i64, Person>,
    groups: BTreeMap<i64, Group>,
    loans: BTreeMap<i64, Loan>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_person_refs(&self, input: &PersonInput) -> Result<(), DatabaseError> {
        match input.group_id {
            Some(group_id) if !self.groups.contains_key(&group_id) => Err(DatabaseError::InvalidReference(
                format!("group {} does not exist", group_id),
            )),
            _ => Ok(()),
        }
    }

    fn check_loan_refs(&self, input: &LoanInput) -> Result<(), DatabaseError> {
        if let Some(person_id) = input.person_id {
            if !self.persons.contains_key(&person_id) {
                return Err(DatabaseError::InvalidReference(format!("person {} does not exist", person_id)));
            }
        }
        if let Some(group_id) = input.group_id {
            if !self.groups.contains_key(&group_id) {
                return Err(DatabaseError::InvalidReference(format!("group {} does not exist", group_id)));
            }
        }
        Ok(())
    }
}

/// Process-local store used in development and by the test suites.
/// Mirrors the constraints of `sql/schema.sql`: unique natural keys,
/// foreign keys, `ON DELETE SET NULL` for person → group and
/// `ON DELETE RESTRICT` for loans.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_persons(&self) -> Result<Vec<Person>, DatabaseError> {
        Ok(self.tables.read().await.persons.values().cloned().collect())
    }

    async fn get_person(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        Ok(self.tables.read().await.persons.get(&id).cloned())
    }

    async fn create_person(&self, input: &PersonInput) -> Result<Person, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.persons.values().any(|p| p.national_id == input.national_id) {
            return Err(DatabaseError::Conflict(format!(
                "national_id {} already registered",
                input.national_id
            )));
        }
        tables.check_person_refs(input)?;

        let now = Utc::now();
        let person = Person {
            id: tables.next_id(),
            full_name: input.full_name.clone(),
            national_id: input.national_id.clone(),
            phone: input.phone.clone(),
            ward: input.ward.clone(),
            group_id: input.group_id,
            created_at: now,
            updated_at: now,
        };
        tables.persons.insert(person.id, person.clone());
        Ok(person)
    }

    async fn update_person(&self, id: i64, input: &PersonInput) -> Result<Option<Person>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.persons.contains_key(&id) {
            return Ok(None);
        }
        if tables
            .persons
            .values()
            .any(|p| p.id != id && p.national_id == input.national_id)
        {
            return Err(DatabaseError::Conflict(format!(
                "national_id {} already registered",
                input.national_id
            )));
        }
        tables.check_person_refs(input)?;

        let Some(person) = tables.persons.get_mut(&id) else {
            return Ok(None);
        };
        person.full_name = input.full_name.clone();
        person.national_id = input.national_id.clone();
        person.phone = input.phone.clone();
        person.ward = input.ward.clone();
        person.group_id = input.group_id;
        person.updated_at = Utc::now();
        Ok(Some(person.clone()))
    }

    async fn delete_person(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.loans.values().any(|l| l.person_id == Some(id)) {
            return Err(DatabaseError::Conflict(format!("person {} still has loans", id)));
        }
        Ok(tables.persons.remove(&id))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DatabaseError> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn create_group(&self, input: &GroupInput) -> Result<Group, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .values()
            .any(|g| g.registration_number == input.registration_number)
        {
            return Err(DatabaseError::Conflict(format!(
                "registration_number {} already registered",
                input.registration_number
            )));
        }

        let now = Utc::now();
        let group = Group {
            id: tables.next_id(),
            name: input.name.clone(),
            registration_number: input.registration_number.clone(),
            ward: input.ward.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, id: i64, input: &GroupInput) -> Result<Option<Group>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&id) {
            return Ok(None);
        }
        if tables
            .groups
            .values()
            .any(|g| g.id != id && g.registration_number == input.registration_number)
        {
            return Err(DatabaseError::Conflict(format!(
                "registration_number {} already registered",
                input.registration_number
            )));
        }

        let Some(group) = tables.groups.get_mut(&id) else {
            return Ok(None);
        };
        group.name = input.name.clone();
        group.registration_number = input.registration_number.clone();
        group.ward = input.ward.clone();
        group.updated_at = Utc::now();
        Ok(Some(group.clone()))
    }

    async fn delete_group(&self, id: i64) -> Result<Option<Group>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.loans.values().any(|l| l.group_id == Some(id)) {
            return Err(DatabaseError::Conflict(format!("group {} still has loans", id)));
        }
        let removed = tables.groups.remove(&id);
        if removed.is_some() {
            for person in tables.persons.values_mut() {
                if person.group_id == Some(id) {
                    person.group_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn list_loans(&self) -> Result<Vec<Loan>, DatabaseError> {
        Ok(self.tables.read().await.loans.values().cloned().collect())
    }

    async fn get_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError> {
        Ok(self.tables.read().await.loans.get(&id).cloned())
    }

    async fn create_loan(&self, input: &LoanInput) -> Result<Loan, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.loans.values().any(|l| l.reference == input.reference) {
            return Err(DatabaseError::Conflict(format!("reference {} already exists", input.reference)));
        }
        tables.check_loan_refs(input)?;

        let now = Utc::now();
        let loan = Loan {
            id: tables.next_id(),
            reference: input.reference.clone(),
            kind: input.kind.clone(),
            amount: input.amount_or_zero(),
            status: input.status.clone(),
            person_id: input.person_id,
            group_id: input.group_id,
            created_at: now,
            updated_at: now,
        };
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn update_loan(&self, id: i64, input: &LoanInput) -> Result<Option<Loan>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.loans.contains_key(&id) {
            return Ok(None);
        }
        if tables
            .loans
            .values()
            .any(|l| l.id != id && l.reference == input.reference)
        {
            return Err(DatabaseError::Conflict(format!("reference {} already exists", input.reference)));
        }
        tables.check_loan_refs(input)?;

        let Some(loan) = tables.loans.get_mut(&id) else {
            return Ok(None);
        };
        loan.reference = input.reference.clone();
        loan.kind = input.kind.clone();
        loan.amount = input.amount_or_zero();
        loan.status = input.status.clone();
        loan.person_id = input.person_id;
        loan.group_id = input.group_id;
        loan.updated_at = Utc::now();
        Ok(Some(loan.clone()))
    }

    async fn delete_loan(&self, id: i64) -> Result<Option<Loan>, DatabaseError> {
        Ok(self.tables.write().await.loans.remove(&id))
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary, DatabaseError> {
        let tables = self.tables.read().await;
        let mut summary = DashboardSummary {
            persons: tables.persons.len() as i64,
            groups: tables.groups.len() as i64,
            loans: tables.loans.len() as i64,
            total_loan_amount: Decimal::ZERO,
            loans_by_status: BTreeMap::new(),
        };
        for loan in tables.loans.values() {
            summary.total_loan_amount += loan.amount;
            *summary.loans_by_status.entry(loan.status.clone()).or_insert(0) += 1;
        }
        Ok(summary)
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DatabaseError> {
        let mut tables = self.tables.write().await;
        let entry = AuditEntry {
            id: tables.next_id(),
            action: entry.action,
            details: entry.details,
            ip_address: entry.ip_address,
            created_at: Utc::now(),
        };
        tables.audit.push(entry.clone());
        Ok(entry)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditEntry>, DatabaseError> {
        let tables = self.tables.read().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        Ok(tables.audit.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, national_id: &str) -> PersonInput {
        PersonInput {
            full_name: name.to_string(),
            national_id: national_id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn national_id_is_unique() {
        let store = MemoryStore::new();
        store.create_person(&person("Amina", "100")).await.unwrap();
        let err = store.create_person(&person("Other", "100")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_rows_return_none() {
        let store = MemoryStore::new();
        assert!(store.update_person(42, &person("A", "1")).await.unwrap().is_none());
        assert!(store.delete_person(42).await.unwrap().is_none());
        assert!(store.delete_loan(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn person_with_unknown_group_is_rejected() {
        let store = MemoryStore::new();
        let mut input = person("A", "1");
        input.group_id = Some(9);
        let err = store.create_person(&input).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn deleting_group_detaches_members() {
        let store = MemoryStore::new();
        let group = store
            .create_group(&GroupInput {
                name: "Umoja".to_string(),
                registration_number: "G-1".to_string(),
                ward: None,
            })
            .await
            .unwrap();
        let mut input = person("A", "1");
        input.group_id = Some(group.id);
        let member = store.create_person(&input).await.unwrap();

        store.delete_group(group.id).await.unwrap();
        let member = store.get_person(member.id).await.unwrap().unwrap();
        assert_eq!(member.group_id, None);
    }

    #[tokio::test]
    async fn audit_entries_come_back_newest_first() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store
                .append(NewAuditEntry {
                    action: "Added Person".to_string(),
                    details: format!("entry {}", n),
                    ip_address: "127.0.0.1".to_string(),
                })
                .await
                .unwrap();
        }
        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].details, "entry 2");
        assert_eq!(recent[1].details, "entry 1");
    }
}
