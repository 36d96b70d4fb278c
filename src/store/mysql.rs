use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use sqlx::MySqlPool;
use tracing::debug;
use uuid::Uuid;

use super::query::EmployeeQuery;
use super::{EmployeeLookup, EmployeePage, EmployeeStore, StoreError, StoreResult};
use crate::model::counter::{Counter, EMPLOYEE_COUNTER};
use crate::model::employee::{Employee, EmployeeFields};
use crate::utils::db_utils::{SqlValue, bind_values, build_list_sql};

const EMPLOYEE_COLUMNS: &str = "handle, id, name, email, department, designation, salary, \
     joining_date, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    handle: String,
    id: u64,
    name: String,
    email: String,
    department: String,
    designation: String,
    salary: f64,
    joining_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let handle = Uuid::parse_str(&row.handle)
            .map_err(|e| StoreError::Backend(format!("corrupt handle {:?}: {e}", row.handle)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| StoreError::Backend(format!("corrupt status {:?}", row.status)))?;

        Ok(Employee {
            handle,
            id: row.id,
            name: row.name,
            email: row.email,
            department: row.department,
            designation: row.designation,
            salary: row.salary,
            joining_date: row.joining_date,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn lookup_clause(lookup: &EmployeeLookup) -> (&'static str, SqlValue) {
    match lookup {
        EmployeeLookup::Handle(handle) => ("handle = ?", SqlValue::String(handle.to_string())),
        EmployeeLookup::Id(id) => ("id = ?", SqlValue::U64(*id)),
    }
}

/// Timestamps are stored as DATETIME(3).
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: SqlValue) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE {clause}");
        bind_values(sqlx::query_as::<_, EmployeeRow>(&sql), &[value])
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn list(&self, query: &EmployeeQuery) -> StoreResult<EmployeePage> {
        let list = build_list_sql(query);

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM employees {}", list.where_clause);
        debug!(sql = %count_sql, bindings = ?list.values, "Counting employees");

        let (total,): (i64,) = bind_values(sqlx::query_as(&count_sql), &list.values)
            .fetch_one(&self.pool)
            .await?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees {} {} LIMIT ? OFFSET ?",
            list.where_clause, list.order_clause
        );
        debug!(
            sql = %data_sql,
            bindings = ?list.values,
            page = query.page,
            limit = query.limit,
            "Fetching employees"
        );

        let rows = bind_values(sqlx::query_as::<_, EmployeeRow>(&data_sql), &list.values)
            .bind(u64::from(query.limit))
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        let employees = rows
            .into_iter()
            .map(Employee::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(EmployeePage {
            employees,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find(&self, lookup: &EmployeeLookup) -> StoreResult<Option<Employee>> {
        let (clause, value) = lookup_clause(lookup);
        self.fetch_one_where(clause, value).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        self.fetch_one_where("email = ?", SqlValue::String(email.to_string())).await
    }

    async fn insert(&self, fields: EmployeeFields) -> StoreResult<Employee> {
        let mut tx = self.pool.begin().await?;

        // The upsert locks the counter row until commit, so concurrent inserts
        // read distinct values. A failed insert rolls the increment back.
        sqlx::query(
            r#"
            INSERT INTO counters (name, seq) VALUES (?, 1)
            ON DUPLICATE KEY UPDATE seq = seq + 1
            "#,
        )
        .bind(EMPLOYEE_COUNTER)
        .execute(&mut *tx)
        .await?;

        let id: u64 = sqlx::query_scalar("SELECT seq FROM counters WHERE name = ?")
            .bind(EMPLOYEE_COUNTER)
            .fetch_one(&mut *tx)
            .await?;

        let employee = Employee::new(Uuid::new_v4(), id, fields, now_millis());

        sqlx::query(
            r#"
            INSERT INTO employees
            (handle, id, name, email, department, designation, salary,
             joining_date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.handle.to_string())
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.designation)
        .bind(employee.salary)
        .bind(employee.joining_date)
        .bind(employee.status.as_ref())
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(id = employee.id, handle = %employee.handle, "Inserted employee");
        Ok(employee)
    }

    async fn update(&self, handle: Uuid, fields: EmployeeFields) -> StoreResult<Option<Employee>> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, email = ?, department = ?, designation = ?, salary = ?,
                joining_date = ?, status = ?, updated_at = ?
            WHERE handle = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.department)
        .bind(&fields.designation)
        .bind(fields.salary)
        .bind(fields.joining_date)
        .bind(fields.status.as_ref())
        .bind(now_millis())
        .bind(handle.to_string())
        .execute(&self.pool)
        .await?;

        // MySQL reports zero affected rows for a no-op update, so re-read instead.
        debug!(%handle, affected = result.rows_affected(), "Updated employee");
        self.find(&EmployeeLookup::Handle(handle)).await
    }

    async fn delete(&self, lookup: &EmployeeLookup) -> StoreResult<bool> {
        let query = match lookup {
            EmployeeLookup::Handle(handle) => {
                sqlx::query("DELETE FROM employees WHERE handle = ?").bind(handle.to_string())
            }
            EmployeeLookup::Id(id) => sqlx::query("DELETE FROM employees WHERE id = ?").bind(*id),
        };
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn counters(&self) -> StoreResult<Vec<Counter>> {
        let counters = sqlx::query_as::<_, Counter>("SELECT name, seq FROM counters ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(counters)
    }

    async fn reset_counter(&self, name: &str, seq: u64) -> StoreResult<Counter> {
        sqlx::query(
            r#"
            INSERT INTO counters (name, seq) VALUES (?, ?)
            ON DUPLICATE KEY UPDATE seq = VALUES(seq)
            "#,
        )
        .bind(name)
        .bind(seq)
        .execute(&self.pool)
        .await?;

        Ok(Counter {
            name: name.to_string(),
            seq,
        })
    }
}
