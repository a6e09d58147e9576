//! Error types and result handling for storage operations.
//!
//! Client-facing failures (bad payloads, rejected addresses) are modelled in
//! the HTTP layer; this module covers what can go wrong below it.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for internal operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input rejected by the database, e.g. an unparseable timestamp.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// SQLSTATE class 22 covers data exceptions such as bad datetime formats and
/// numeric overflow.
const DATA_EXCEPTION_CLASS: &str = "22";

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested entity not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err)
                if db_err.code().is_some_and(|code| code.starts_with(DATA_EXCEPTION_CLASS)) =>
            {
                Self::InvalidInput(db_err.to_string())
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

impl CoreError {
    /// Short, stable label for structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}
