use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::query::EmployeeQuery;
use super::{EmployeeLookup, EmployeePage, EmployeeStore, StoreError, StoreResult};
use crate::model::counter::{Counter, EMPLOYEE_COUNTER};
use crate::model::employee::{Employee, EmployeeFields};

/// Process-local store with the same uniqueness and counter rules as MySQL.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    /// Insertion order stands in for the store's natural order.
    employees: Vec<Employee>,
    counters: BTreeMap<String, u64>,
}

impl MemoryState {
    fn position(&self, lookup: &EmployeeLookup) -> Option<usize> {
        self.employees.iter().position(|e| match lookup {
            EmployeeLookup::Handle(handle) => e.handle == *handle,
            EmployeeLookup::Id(id) => e.id == *id,
        })
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.employees
            .iter()
            .any(|e| e.email == email && Some(e.handle) != except)
    }

    /// Takes the next counter value. A value already held by a record is an
    /// integrity error, as the unique id index reports it in MySQL, and the
    /// counter is left where it was.
    fn next_sequence(&mut self, name: &str) -> StoreResult<u64> {
        let next = self.counters.get(name).copied().unwrap_or(0) + 1;
        if self.position(&EmployeeLookup::Id(next)).is_some() {
            return Err(StoreError::Backend(format!(
                "duplicate employee id {next} from counter {name}"
            )));
        }
        self.counters.insert(name.to_string(), next);
        Ok(next)
    }
}

impl MemoryStore {
    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list(&self, query: &EmployeeQuery) -> StoreResult<EmployeePage> {
        let state = self.state()?;

        let mut matched: Vec<&Employee> = state
            .employees
            .iter()
            .filter(|e| query.matches(e))
            .collect();
        matched.sort_by(|a, b| query.compare(a, b));

        let total = matched.len() as u64;
        let employees = matched
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(EmployeePage { employees, total })
    }

    async fn find(&self, lookup: &EmployeeLookup) -> StoreResult<Option<Employee>> {
        let state = self.state()?;
        Ok(state.position(lookup).map(|i| state.employees[i].clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let state = self.state()?;
        Ok(state.employees.iter().find(|e| e.email == email).cloned())
    }

    async fn insert(&self, fields: EmployeeFields) -> StoreResult<Employee> {
        let mut state = self.state()?;
        if state.email_taken(&fields.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = state.next_sequence(EMPLOYEE_COUNTER)?;
        let employee = Employee::new(Uuid::new_v4(), id, fields, Utc::now());
        state.employees.push(employee.clone());
        Ok(employee)
    }

    async fn update(&self, handle: Uuid, fields: EmployeeFields) -> StoreResult<Option<Employee>> {
        let mut state = self.state()?;
        if state.email_taken(&fields.email, Some(handle)) {
            return Err(StoreError::DuplicateEmail);
        }

        let Some(i) = state.position(&EmployeeLookup::Handle(handle)) else {
            return Ok(None);
        };
        let employee = &mut state.employees[i];
        employee.apply(fields, Utc::now());
        Ok(Some(employee.clone()))
    }

    async fn delete(&self, lookup: &EmployeeLookup) -> StoreResult<bool> {
        let mut state = self.state()?;
        match state.position(lookup) {
            Some(i) => {
                state.employees.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn counters(&self) -> StoreResult<Vec<Counter>> {
        let state = self.state()?;
        Ok(state
            .counters
            .iter()
            .map(|(name, seq)| Counter {
                name: name.clone(),
                seq: *seq,
            })
            .collect())
    }

    async fn reset_counter(&self, name: &str, seq: u64) -> StoreResult<Counter> {
        let mut state = self.state()?;
        state.counters.insert(name.to_string(), seq);
        Ok(Counter {
            name: name.to_string(),
            seq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::EmployeeStatus;
    use chrono::NaiveDate;

    fn fields(email: &str) -> EmployeeFields {
        EmployeeFields {
            name: "Sam Lee".to_string(),
            email: email.to_string(),
            department: "Finance".to_string(),
            designation: "Manager".to_string(),
            salary: 72000.0,
            joining_date: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
            status: EmployeeStatus::Active,
        }
    }

    #[actix_web::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryStore::default();

        let first = store.insert(fields("a@example.com")).await.unwrap();
        let second = store.insert(fields("b@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_ne!(first.handle, second.handle);
        assert_eq!(
            store.counters().await.unwrap(),
            vec![Counter {
                name: EMPLOYEE_COUNTER.to_string(),
                seq: 2
            }]
        );
    }

    #[actix_web::test]
    async fn unique_email_is_enforced_on_write() {
        let store = MemoryStore::default();
        store.insert(fields("a@example.com")).await.unwrap();

        let err = store.insert(fields("a@example.com")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);

        // a rejected insert does not consume a sequence value
        let next = store.insert(fields("c@example.com")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[actix_web::test]
    async fn update_rejects_another_employees_email() {
        let store = MemoryStore::default();
        let a = store.insert(fields("a@example.com")).await.unwrap();
        store.insert(fields("b@example.com")).await.unwrap();

        let err = store.update(a.handle, fields("b@example.com")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);

        let kept = store.update(a.handle, fields("a@example.com")).await.unwrap();
        assert!(kept.is_some());

        let missing = store.update(Uuid::new_v4(), fields("z@example.com")).await.unwrap();
        assert!(missing.is_none());
    }

    #[actix_web::test]
    async fn reset_counter_rebases_ids() {
        let store = MemoryStore::default();
        store.reset_counter(EMPLOYEE_COUNTER, 2_511_980_000).await.unwrap();

        let employee = store.insert(fields("a@example.com")).await.unwrap();
        assert_eq!(employee.id, 2_511_980_001);
    }

    #[actix_web::test]
    async fn rewound_counter_cannot_reuse_a_live_id() {
        let store = MemoryStore::default();
        let first = store.insert(fields("a@example.com")).await.unwrap();
        assert_eq!(first.id, 1);

        store.reset_counter(EMPLOYEE_COUNTER, 0).await.unwrap();
        let err = store.insert(fields("b@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        // the failed insert leaves the counter and the records untouched
        assert_eq!(store.counters().await.unwrap()[0].seq, 0);
        let page = store.list(&EmployeeQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);

        store.reset_counter(EMPLOYEE_COUNTER, 1).await.unwrap();
        let next = store.insert(fields("b@example.com")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[actix_web::test]
    async fn delete_by_either_address() {
        let store = MemoryStore::default();
        let a = store.insert(fields("a@example.com")).await.unwrap();
        let b = store.insert(fields("b@example.com")).await.unwrap();

        assert!(store.delete(&EmployeeLookup::Id(a.id)).await.unwrap());
        assert!(store.delete(&EmployeeLookup::Handle(b.handle)).await.unwrap());
        assert!(!store.delete(&EmployeeLookup::Id(a.id)).await.unwrap());
    }
}
