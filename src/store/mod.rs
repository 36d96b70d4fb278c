pub mod memory;
pub mod mysql;
pub mod query;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use derive_more::Display;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::model::counter::Counter;
use crate::model::employee::{Employee, EmployeeFields};
use memory::MemoryStore;
use mysql::MySqlStore;
use query::EmployeeQuery;

#[derive(Debug, Display, PartialEq)]
pub enum StoreError {
    /// The unique email index rejected a write.
    #[display(fmt = "Email already exists")]
    DuplicateEmail,

    #[display(fmt = "{}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // 23000: integrity constraint violation
            if db_err.code() == Some("23000".into()) && db_err.message().contains("email") {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How a path segment addresses an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeLookup {
    Handle(Uuid),
    Id(u64),
}

impl EmployeeLookup {
    /// A UUID wins over a number; anything else addresses nothing.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(handle) = Uuid::parse_str(raw) {
            return Some(EmployeeLookup::Handle(handle));
        }
        raw.parse().ok().map(EmployeeLookup::Id)
    }
}

/// One page of a list query plus the unpaged match count.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeePage {
    pub employees: Vec<Employee>,
    pub total: u64,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn list(&self, query: &EmployeeQuery) -> StoreResult<EmployeePage>;

    async fn find(&self, lookup: &EmployeeLookup) -> StoreResult<Option<Employee>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;

    /// Takes the next value of the employee counter and stores the record under it.
    async fn insert(&self, fields: EmployeeFields) -> StoreResult<Employee>;

    /// Replaces the mutable fields; `None` when the handle no longer exists.
    async fn update(&self, handle: Uuid, fields: EmployeeFields) -> StoreResult<Option<Employee>>;

    /// Returns whether a record was removed.
    async fn delete(&self, lookup: &EmployeeLookup) -> StoreResult<bool>;

    async fn counters(&self) -> StoreResult<Vec<Counter>>;

    async fn reset_counter(&self, name: &str, seq: u64) -> StoreResult<Counter>;
}

pub async fn connect(config: &Config) -> Result<Arc<dyn EmployeeStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory employee store");
            Ok(Arc::new(MemoryStore::default()))
        }
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
            let pool = db::init_db(url, config.db_max_connections)
                .await
                .context("Failed to connect to database")?;
            db::ensure_schema(&pool)
                .await
                .context("Failed to prepare database schema")?;
            info!("Connected to MySQL employee store");
            Ok(Arc::new(MySqlStore::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct MySqlFailure {
        code: &'static str,
        message: &'static str,
    }

    impl fmt::Display for MySqlFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for MySqlFailure {}

    impl DatabaseError for MySqlFailure {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn db_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(MySqlFailure { code, message }))
    }

    #[test]
    fn email_index_violation_is_a_duplicate_email() {
        let err = StoreError::from(db_error(
            "23000",
            "Duplicate entry 'ann@example.com' for key 'employees.uq_employees_email'",
        ));
        assert_eq!(err, StoreError::DuplicateEmail);

        let api = ApiError::from(err);
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(api.to_string(), "Email already exists");
    }

    #[test]
    fn other_integrity_violations_are_backend_failures() {
        let err = StoreError::from(db_error(
            "23000",
            "Duplicate entry '7' for key 'employees.uq_employees_id'",
        ));
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(
            ApiError::from(err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let err = StoreError::from(db_error("42S02", "Table 'employees' doesn't exist"));
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn lookup_prefers_handle_then_number() {
        let handle = Uuid::new_v4();
        assert_eq!(
            EmployeeLookup::parse(&handle.to_string()),
            Some(EmployeeLookup::Handle(handle))
        );
        assert_eq!(
            EmployeeLookup::parse("2511980001"),
            Some(EmployeeLookup::Id(2_511_980_001))
        );
        assert_eq!(EmployeeLookup::parse("abc"), None);
        assert_eq!(EmployeeLookup::parse("-4"), None);
    }
}
