//! Auth errors

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Lookup miss
    #[error("not found")]
    NotFound,

    /// Uniqueness violation (e.g. email already registered)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown email or wrong password; the two are deliberately not
    /// distinguished
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A write targeted a stale id and changed nothing
    #[error("no rows affected")]
    NoRowsAffected,

    /// Underlying store failure
    #[error("persistence error: {0}")]
    Persistence(#[source] planner_db::DbError),

    /// Token signature or algorithm did not verify, or the token is malformed
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    Expired,

    /// Request violates a domain rule (e.g. unknown role)
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// The session a token is bound to is gone or deactivated
    #[error("session inactive")]
    SessionInactive,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::InvalidSignature
            | Self::Expired
            | Self::SessionInactive => 401,
            Self::PolicyViolation(_) => 403,
            Self::NotFound => 404,
            Self::Conflict(_) | Self::NoRowsAffected => 409,
            Self::Persistence(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::NoRowsAffected => "NO_ROWS_AFFECTED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::InvalidSignature => "INVALID_TOKEN",
            Self::Expired => "TOKEN_EXPIRED",
            Self::PolicyViolation(_) => "POLICY_VIOLATION",
            Self::SessionInactive => "SESSION_INACTIVE",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error comes from the store rather than from the request
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<planner_db::DbError> for AuthError {
    fn from(err: planner_db::DbError) -> Self {
        use planner_db::DbError;
        match err {
            DbError::Conflict(what) => Self::Conflict(what),
            DbError::NoRowsAffected => Self::NoRowsAffected,
            err @ DbError::Sqlx(_) => {
                tracing::error!("Database error: {}", err);
                Self::Persistence(err)
            }
        }
    }
}

impl From<crate::crypto::SigningKeyError> for AuthError {
    fn from(err: crate::crypto::SigningKeyError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_db::DbError;
    use std::error::Error as _;

    #[test]
    fn test_db_errors_keep_their_kind() {
        assert!(matches!(
            AuthError::from(DbError::NoRowsAffected),
            AuthError::NoRowsAffected
        ));
        assert!(matches!(
            AuthError::from(DbError::Conflict("user already exists".into())),
            AuthError::Conflict(_)
        ));
    }

    #[test]
    fn test_persistence_preserves_source() {
        let err = AuthError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, AuthError::Persistence(_)));
        let source = err.source().expect("source is preserved");
        assert!(source.to_string().contains("pool timed out"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_credentials_and_missing_user_look_alike() {
        // Login never returns NotFound; the credential error is the only
        // externally visible signal.
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
    }
}
