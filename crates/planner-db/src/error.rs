//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Unique constraint violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// A write statement matched zero rows
    #[error("no rows affected")]
    NoRowsAffected,
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Map an insert failure, turning unique violations into [`DbError::Conflict`]
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("{what} already exists"))
            }
            _ => Self::Sqlx(err),
        }
    }
}

/// Fail with [`DbError::NoRowsAffected`] when a write touched nothing
pub(crate) fn ensure_affected(rows_affected: u64) -> DbResult<u64> {
    if rows_affected == 0 {
        Err(DbError::NoRowsAffected)
    } else {
        Ok(rows_affected)
    }
}
