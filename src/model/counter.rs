use serde::{Deserialize, Serialize};

/// Name of the counter that mints employee ids.
pub const EMPLOYEE_COUNTER: &str = "employeeId";

/// Value `counter reset` rewinds to when none is given.
pub const DEFAULT_COUNTER_BASE: u64 = 2_511_980_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: u64,
}
