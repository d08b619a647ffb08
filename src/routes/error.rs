//! HTTP error envelope.
//!
//! Service errors convert into [`ApiError`], which renders
//! `{"error": "<message>"}` with the mapped status. Server-side failures are
//! logged here and reach the client only as a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::services::account::AccountError;
use crate::services::category::CategoryError;
use crate::services::domain::DomainError;
use crate::services::faq::FaqError;
use crate::services::site::SiteError;
use crate::services::storage::StorageError;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication required")
    }

    /// Log `err` and hide it behind a generic 500.
    pub fn internal(err: &dyn std::fmt::Display) -> Self {
        error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

// =============================================================================
// SERVICE ERROR MAPPING
// =============================================================================

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(&err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<SiteError> for ApiError {
    fn from(err: SiteError) -> Self {
        let status = match &err {
            SiteError::NotFound(_) => StatusCode::NOT_FOUND,
            SiteError::Forbidden(_) => StatusCode::FORBIDDEN,
            SiteError::InvalidName | SiteError::Domain(_) | SiteError::Theme(_) => StatusCode::BAD_REQUEST,
            SiteError::DomainTaken(_) => StatusCode::CONFLICT,
            SiteError::Database(_) => return Self::internal(&err),
        };
        Self::new(status, err.to_string())
    }
}

impl From<FaqError> for ApiError {
    fn from(err: FaqError) -> Self {
        let status = match err {
            FaqError::Site(inner) => return inner.into(),
            FaqError::NotFound(_) => StatusCode::NOT_FOUND,
            FaqError::EmptyQuestion | FaqError::EmptyAnswer | FaqError::InvalidOrder => StatusCode::BAD_REQUEST,
            FaqError::Database(ref e) => return Self::internal(e),
        };
        Self::new(status, err.to_string())
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        let status = match err {
            CategoryError::Site(inner) => return inner.into(),
            CategoryError::EmptyName => StatusCode::BAD_REQUEST,
            CategoryError::Duplicate(_) => StatusCode::CONFLICT,
            CategoryError::NotFound(_) => StatusCode::NOT_FOUND,
            CategoryError::Database(ref e) => return Self::internal(e),
        };
        Self::new(status, err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let status = match &err {
            AccountError::InvalidEmail | AccountError::WeakPassword => StatusCode::BAD_REQUEST,
            AccountError::EmailTaken => StatusCode::CONFLICT,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::Hash(_) | AccountError::Database(_) => return Self::internal(&err),
        };
        Self::new(status, err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let status = match err {
            StorageError::Account(inner) => return inner.into(),
            StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            StorageError::NotAnImage(_) | StorageError::Empty | StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            StorageError::ForeignObject(_) => StatusCode::FORBIDDEN,
            StorageError::Backend(ref e) => {
                error!(error = %e, "storage backend failed");
                return Self::new(StatusCode::BAD_GATEWAY, "storage backend unavailable");
            }
            StorageError::Io(ref e) => return Self::internal(e),
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
