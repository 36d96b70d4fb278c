use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    ToSchema,
)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "_id": "5f0c8a8e-4a43-4c55-9a4f-2f0f6e7b1c11",
        "id": 2511980001u64,
        "name": "Jane Doe",
        "email": "jane.doe@company.com",
        "department": "Engineering",
        "designation": "Software Engineer",
        "salary": 85000.0,
        "joining_date": "2024-01-15",
        "status": "Active",
        "createdAt": "2024-01-15T09:30:00Z",
        "updatedAt": "2024-01-15T09:30:00Z"
    })
)]
pub struct Employee {
    /// Store-native document handle
    #[serde(rename = "_id")]
    #[schema(value_type = String, format = "uuid")]
    pub handle: Uuid,

    /// Sequential human-readable id
    #[schema(example = 2511980001u64)]
    pub id: u64,

    pub name: String,
    pub email: String,
    pub department: String,
    pub designation: String,
    pub salary: f64,

    #[schema(value_type = String, format = "date")]
    pub joining_date: NaiveDate,

    pub status: EmployeeStatus,

    #[serde(rename = "createdAt")]
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn new(handle: Uuid, id: u64, fields: EmployeeFields, now: DateTime<Utc>) -> Self {
        Self {
            handle,
            id,
            name: fields.name,
            email: fields.email,
            department: fields.department,
            designation: fields.designation,
            salary: fields.salary,
            joining_date: fields.joining_date,
            status: fields.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, fields: EmployeeFields, now: DateTime<Utc>) {
        self.name = fields.name;
        self.email = fields.email;
        self.department = fields.department;
        self.designation = fields.designation;
        self.salary = fields.salary;
        self.joining_date = fields.joining_date;
        self.status = fields.status;
        self.updated_at = now;
    }
}

/// The mutable part of an employee, normalised and validated.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct EmployeeFields {
    #[validate(length(max = 100, message = "Name cannot exceed 100 characters"))]
    pub name: String,

    #[validate(
        length(max = 100, message = "Email cannot exceed 100 characters"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(length(max = 50, message = "Department cannot exceed 50 characters"))]
    pub department: String,

    #[validate(length(max = 50, message = "Designation cannot exceed 50 characters"))]
    pub designation: String,

    #[validate(range(min = 0.0, message = "Salary cannot be negative"))]
    pub salary: f64,

    pub joining_date: NaiveDate,
    pub status: EmployeeStatus,
}

impl EmployeeFields {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.department = self.department.trim().to_string();
        self.designation = self.designation.trim().to_string();
        self
    }

    pub fn validated(self) -> Result<Self, ApiError> {
        let fields = self.normalized();

        for (label, value) in [
            ("Name", &fields.name),
            ("Email", &fields.email),
            ("Department", &fields.department),
            ("Designation", &fields.designation),
        ] {
            if value.is_empty() {
                return Err(required(label));
            }
        }

        fields.validate().map_err(validation_message)?;
        Ok(fields)
    }
}

fn validation_message(errors: ValidationErrors) -> ApiError {
    let mut messages: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let field = field.to_string();
            let message = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field, message)
        })
        .collect();
    messages.sort();

    let joined = messages
        .into_iter()
        .map(|(_, message)| message)
        .collect::<Vec<_>>()
        .join(", ");
    ApiError::validation(joined)
}

fn required(label: &str) -> ApiError {
    ApiError::validation(format!("{label} is required"))
}

/// HTML number inputs submit strings, so salary accepts either form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    Number(f64),
    Text(String),
}

/// Request body for both create and update. Every field is optional here;
/// `into_new` enforces presence, `apply_to` merges onto a stored record.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "name": "Jane Doe",
        "email": "Jane.Doe@Company.com",
        "department": "Engineering",
        "designation": "Software Engineer",
        "salary": 85000,
        "joining_date": "2024-01-15",
        "status": "Active"
    })
)]
pub struct EmployeeInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(format = "email")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub salary: Option<FormNumber>,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(format = "date")]
    pub joining_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<EmployeeStatus>)]
    pub status: Option<String>,
}

impl EmployeeInput {
    pub fn into_new(self) -> Result<EmployeeFields, ApiError> {
        let name = required_text(self.name, "Name")?;
        let email = required_text(self.email, "Email")?;
        let department = required_text(self.department, "Department")?;
        let designation = required_text(self.designation, "Designation")?;
        let salary = parse_salary(self.salary)?.ok_or_else(|| required("Salary"))?;
        let joining_date =
            parse_joining_date(self.joining_date)?.ok_or_else(|| required("Joining date"))?;
        let status = parse_status(self.status)?.unwrap_or_default();

        EmployeeFields {
            name,
            email,
            department,
            designation,
            salary,
            joining_date,
            status,
        }
        .validated()
    }

    pub fn apply_to(self, existing: &Employee) -> Result<EmployeeFields, ApiError> {
        let salary = parse_salary(self.salary)?.unwrap_or(existing.salary);
        let joining_date = parse_joining_date(self.joining_date)?.unwrap_or(existing.joining_date);
        let status = parse_status(self.status)?.unwrap_or(existing.status);

        EmployeeFields {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            email: self.email.unwrap_or_else(|| existing.email.clone()),
            department: self.department.unwrap_or_else(|| existing.department.clone()),
            designation: self.designation.unwrap_or_else(|| existing.designation.clone()),
            salary,
            joining_date,
            status,
        }
        .validated()
    }
}

fn required_text(value: Option<String>, label: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(required(label)),
    }
}

fn parse_salary(value: Option<FormNumber>) -> Result<Option<f64>, ApiError> {
    let salary = match value {
        None => return Ok(None),
        Some(FormNumber::Number(n)) => n,
        Some(FormNumber::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(required("Salary"));
            }
            text.parse::<f64>()
                .map_err(|_| ApiError::validation("Salary must be a number"))?
        }
    };

    if !salary.is_finite() {
        return Err(ApiError::validation("Salary must be a number"));
    }
    Ok(Some(salary))
}

fn parse_joining_date(value: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(required("Joining date"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| ApiError::validation("Invalid joining date"))
}

fn parse_status(value: Option<String>) -> Result<Option<EmployeeStatus>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation("Status must be either Active or Inactive")),
    }
}
