use std::cmp::Ordering;
use strum_macros::EnumString;

use crate::model::employee::Employee;

/// Fields a list can be ordered by. Accepts the wire (camelCase) names and the column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum SortField {
    #[strum(serialize = "id")]
    Id,
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "email")]
    Email,
    #[strum(serialize = "department")]
    Department,
    #[strum(serialize = "designation")]
    Designation,
    #[strum(serialize = "salary")]
    Salary,
    #[strum(serialize = "joining_date", serialize = "joiningDate")]
    JoiningDate,
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "createdAt", serialize = "created_at")]
    CreatedAt,
    #[strum(serialize = "updatedAt", serialize = "updated_at")]
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::Department => "department",
            SortField::Designation => "designation",
            SortField::Salary => "salary",
            SortField::JoiningDate => "joining_date",
            SortField::Status => "status",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn compare(self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Department => a.department.cmp(&b.department),
            SortField::Designation => a.designation.cmp(&b.designation),
            SortField::Salary => a.salary.total_cmp(&b.salary),
            SortField::JoiningDate => a.joining_date.cmp(&b.joining_date),
            SortField::Status => a.status.as_ref().cmp(b.status.as_ref()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` sorts descending; anything else is ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A list request after query-string parsing. Both store backends
/// interpret it with the same semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for EmployeeQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            search: None,
            department: None,
            designation: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl EmployeeQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit.max(1)))
    }

    /// A search term that is a plain unsigned number also matches the sequential id.
    pub fn search_id(&self) -> Option<u64> {
        self.search.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(department) = &self.department {
            if &employee.department != department {
                return false;
            }
        }
        if let Some(designation) = &self.designation {
            if &employee.designation != designation {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let by_text = employee.name.to_lowercase().contains(&needle)
                || employee.email.to_lowercase().contains(&needle);
            let by_id = self.search_id() == Some(employee.id);
            if !(by_text || by_id) {
                return false;
            }
        }
        true
    }

    /// Ordering for the requested field; ties fall back to `id` in the same direction.
    pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        let ordering = self.sort.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}
