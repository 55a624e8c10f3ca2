//! # API Error Types
//!
//! Maps repository and domain failures onto HTTP status codes, rendered as
//! the standard envelope.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  DbError::NotFound                         → 404                 │
//! │  DbError::Domain / Unique / ForeignKey     → 400                 │
//! │  CoreError, ValidationError, bad JSON      → 400                 │
//! │  failed login                              → 401                 │
//! │  route exists, wrong verb                  → 405                 │
//! │  anything else (connection, query, ...)    → 500, logged         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ruedas_core::{CoreError, ValidationError};
use ruedas_db::DbError;
use thiserror::Error;
use tracing::{error, warn};

use crate::envelope::Envelope;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Carries the raw error text; the client sees it as-is.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Envelope::failure(self.to_string())).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::Domain(core) => core.into(),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                warn!(error = %err, "Constraint violation");
                ApiError::BadRequest(err.to_string())
            }
            other => {
                error!(error = %other, "Database failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        warn!(error = %err, "Request rejected");
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        assert_eq!(
            ApiError::from(DbError::not_found("Product", 9)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::duplicate("barcode", "750")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DbError::ConnectionFailed("disk gone".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_are_bad_requests() {
        let err = ApiError::from(DbError::Domain(CoreError::InsufficientStock {
            products: vec!["Cadena KMC X11".into(), "ID 7".into()],
        }));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Insufficient stock for: Cadena KMC X11; ID 7");
    }

    #[test]
    fn test_internal_keeps_raw_text() {
        let err = ApiError::from(DbError::QueryFailed("no such table: ventas".into()));

        assert_eq!(err.to_string(), "Query failed: no such table: ventas");
    }

    #[test]
    fn test_validation_error_maps_to_400() {
        let err = ApiError::from(ValidationError::required("name"));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("name is required"));
    }
}
