//! Error types for the planner API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use planner_auth_core::AuthError;
use planner_db::DbError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error")]
    Database(#[from] DbError),
}

impl ApiError {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Database(DbError::Conflict(_) | DbError::NoRowsAffected) => StatusCode::CONFLICT,
            Self::Database(DbError::Sqlx(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Auth(e) => e.error_code(),
            Self::Database(DbError::Conflict(_)) => "CONFLICT",
            Self::Database(DbError::NoRowsAffected) => "NO_ROWS_AFFECTED",
            Self::Database(DbError::Sqlx(_)) => "INTERNAL_ERROR",
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Store failures are logged here and hidden from the client
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_keep_their_status() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Expired, StatusCode::UNAUTHORIZED),
            (AuthError::SessionInactive, StatusCode::UNAUTHORIZED),
            (AuthError::PolicyViolation("x".into()), StatusCode::FORBIDDEN),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
            (AuthError::Conflict("x".into()), StatusCode::CONFLICT),
            (AuthError::NoRowsAffected, StatusCode::CONFLICT),
            (AuthError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Database(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).error_code(),
            "INVALID_CREDENTIALS"
        );
        assert_eq!(ApiError::NotFound("Event").error_code(), "NOT_FOUND");
        assert_eq!(ApiError::NotFound("Event").to_string(), "Event not found");
        assert_eq!(
            ApiError::Database(DbError::NoRowsAffected).status_code(),
            StatusCode::CONFLICT
        );
    }
}
