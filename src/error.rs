//! Structured error type for API responses.
//!
//! Messages are user-facing and written in Arabic, matching the client UI.

use crate::lifecycle::TransitionError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidTransition,

    // Authentication / authorization
    UserNotFound,
    WrongPassword,
    Unauthorized,
    Forbidden,

    // Lookup
    NotFound,

    // Conflicts
    AlreadyExists,
    Conflict,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::InvalidTransition => StatusCode::BAD_REQUEST,
            ErrorCode::UserNotFound | ErrorCode::WrongPassword | ErrorCode::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error for API responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("الحقل مطلوب: {}", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, "قيمة غير صالحة")
            .with_field(field)
            .with_details(reason)
    }

    /// Request body that is not a JSON document at all.
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, "بيانات الطلب غير صالحة")
            .with_field("body")
            .with_details(reason)
    }

    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::UserNotFound, "اسم المستخدم غير موجود")
    }

    pub fn wrong_password() -> Self {
        Self::new(ErrorCode::WrongPassword, "كلمة السر غير صحيحة")
    }

    pub fn unauthorized(reason: &str) -> Self {
        Self::new(ErrorCode::Unauthorized, "يجب تسجيل الدخول").with_details(reason)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, "ليس لديك صلاحية لهذا الإجراء")
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, "المهمة غير موجودة").with_details(task_id)
    }

    pub fn company_not_found(company_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, "الشركة غير موجودة").with_details(company_id)
    }

    pub fn employee_not_found(employee_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, "الموظف غير موجود").with_details(employee_id)
    }

    pub fn category_not_found(category_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, "نوع المهمة غير موجود").with_details(category_id)
    }

    pub fn username_taken(username: &str) -> Self {
        Self::new(ErrorCode::AlreadyExists, "اسم المستخدم مستخدم بالفعل")
            .with_field("username")
            .with_details(username)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, "حدث خطأ في الاتصال").with_details(err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, "حدث خطأ غير متوقع").with_details(err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} ({})", self.message, details),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        let message = match &err {
            TransitionError::Unchanged(status) => {
                format!("المهمة بالفعل في حالة {}", status.label_ar())
            }
            TransitionError::NotAllowed { from, to } => format!(
                "لا يمكن تغيير حالة المهمة من {} إلى {}",
                from.label_ar(),
                to.label_ar()
            ),
        };
        Self::new(ErrorCode::InvalidTransition, message)
            .with_field("status")
            .with_details(err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(db_err) => ApiError::database(db_err),
                Err(err) => ApiError::internal(err),
            },
        }
    }
}

/// Turn a serde path error (`priority: unknown variant ...`) into a field error.
fn deserialize_error(detail: &str) -> ApiError {
    let missing = detail
        .split_once("missing field `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(field, _)| field);
    if let Some(field) = missing {
        return ApiError::missing_field(field).with_details(detail);
    }
    match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(' ') => {
            ApiError::invalid_value(path, reason)
        }
        _ => ApiError::new(ErrorCode::InvalidFieldValue, "قيمة غير صالحة").with_details(detail),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => {
                let detail = text
                    .split_once("target type: ")
                    .map_or(text.as_str(), |(_, d)| d);
                deserialize_error(detail)
            }
            _ => ApiError::invalid_body(text),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        let detail = text.split_once("query string: ").map_or(text.as_str(), |(_, d)| d);
        deserialize_error(detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let mut body = self;
        if status.is_server_error() {
            error!(code = ?body.code, details = ?body.details, "Request failed with internal error");
            // Internal details stay in the log.
            body.details = None;
        } else {
            warn!(code = ?body.code, message = %body.message, "Request rejected");
        }
        (status, Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
