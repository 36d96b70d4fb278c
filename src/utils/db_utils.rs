use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::QueryAs;

use crate::store::query::EmployeeQuery;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
}

/// ===============================
/// SQL list container
/// ===============================
#[derive(Debug)]
pub struct ListSql {
    /// Empty, or `WHERE ...` with `?` placeholders
    pub where_clause: String,
    pub order_clause: String,
    pub values: Vec<SqlValue>,
}

/// Escape `LIKE` metacharacters so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// ===============================
/// Build WHERE / ORDER BY for a list query
/// ===============================
pub fn build_list_sql(query: &EmployeeQuery) -> ListSql {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(search) = &query.search {
        let like = format!("%{}%", escape_like(&search.to_lowercase()));
        let mut search_clause = "(LOWER(name) LIKE ? OR LOWER(email) LIKE ?".to_string();
        values.push(SqlValue::String(like.clone()));
        values.push(SqlValue::String(like));

        if let Some(id) = query.search_id() {
            search_clause.push_str(" OR id = ?");
            values.push(SqlValue::U64(id));
        }
        search_clause.push(')');
        conditions.push(search_clause);
    }

    if let Some(department) = &query.department {
        conditions.push("department = ?".to_string());
        values.push(SqlValue::String(department.clone()));
    }

    if let Some(designation) = &query.designation {
        conditions.push("designation = ?".to_string());
        values.push(SqlValue::String(designation.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // Column names come from a closed enum, never from the request.
    let direction = query.order.keyword();
    let order_clause = if query.sort.column() == "id" {
        format!("ORDER BY id {direction}")
    } else {
        format!(
            "ORDER BY {} {direction}, id {direction}",
            query.sort.column()
        )
    };

    ListSql {
        where_clause,
        order_clause,
        values,
    }
}

/// ===============================
/// Bind the collected values in order
/// ===============================
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::String(v) => query.bind(v.clone()),
            SqlValue::U64(v) => query.bind(*v),
        };
    }
    query
}
