//! API error envelope shared by all handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::matching::lifecycle::LifecycleError;

/// Machine-readable error codes surfaced to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    NotFound,
    InvalidAction,
    InvalidStatus,
    InvalidTransition,
    MutualConsentRequired,
    Database,
    Internal,
}

impl ApiErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::InvalidAction => "invalid_action",
            ApiErrorCode::InvalidStatus => "invalid_status",
            ApiErrorCode::InvalidTransition => "invalid_transition",
            ApiErrorCode::MutualConsentRequired => "mutual_consent_required",
            ApiErrorCode::Database => "database_error",
            ApiErrorCode::Internal => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidAction | ApiErrorCode::InvalidStatus => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidTransition | ApiErrorCode::MutualConsentRequired => {
                StatusCode::CONFLICT
            }
            ApiErrorCode::Database | ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
            }
        }));
        (self.code.status(), body).into_response()
    }
}

/// Log a database failure and return an opaque API error.
pub fn db_error(context: &str, e: anyhow::Error) -> ApiError {
    error!(error = ?e, "{context} failed");
    ApiError::new(ApiErrorCode::Database, format!("{context} failed"))
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        match &e {
            LifecycleError::NotFound { .. } => ApiError::new(ApiErrorCode::NotFound, e.to_string()),
            LifecycleError::InvalidTransition { .. } => {
                ApiError::new(ApiErrorCode::InvalidTransition, e.to_string())
            }
            LifecycleError::MutualConsentRequired => {
                ApiError::new(ApiErrorCode::MutualConsentRequired, e.to_string())
            }
            LifecycleError::CorruptStatus(_) => {
                error!(error = %e, "Corrupt lifecycle status in store");
                ApiError::new(ApiErrorCode::Internal, "Stored record is unreadable")
            }
            LifecycleError::Store(db) => {
                error!(error = ?db, "Lifecycle store operation failed");
                ApiError::new(ApiErrorCode::Database, "Store operation failed")
            }
        }
    }
}
