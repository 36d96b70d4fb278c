use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use tracing::error;

use crate::api::employee::MessageResponse;
use crate::store::StoreError;

pub const EMAIL_EXISTS: &str = "Email already exists";

/// Every failure an employee endpoint can report. Rendered as `{"message": ...}`.
#[derive(Debug, Display, PartialEq)]
pub enum ApiError {
    /// 400 with a field-level message
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "Employee not found")]
    NotFound,

    /// 500 carrying the raw store message
    #[display(fmt = "{}", _0)]
    Store(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn duplicate_email() -> Self {
        ApiError::Validation(EMAIL_EXISTS.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(MessageResponse {
            message: self.to_string(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::duplicate_email(),
            StoreError::Backend(message) => {
                error!(error = %message, "Store operation failed");
                ApiError::Store(message)
            }
        }
    }
}
