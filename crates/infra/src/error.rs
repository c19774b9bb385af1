//! Repository error model.

use thiserror::Error;

use catalog_core::DomainError;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository operation error.
///
/// - **Validation**: the entity or the call violates a data/lifecycle rule;
///   nothing was written.
/// - **Storage**: the database rejected or failed the operation; the
///   transaction was rolled back before this was returned.
/// - **Config**: the database configuration could not be built.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("storage error in {operation}: {message}")]
    Storage { operation: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl RepositoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(DomainError::validation(msg))
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

/// Map SQLx errors to `RepositoryError::Storage`, naming the constraint class
/// for the PostgreSQL error codes a product write can hit.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let kind = match db_err.code().as_deref() {
                Some("23505") => "unique violation",
                Some("23502") => "not-null violation",
                Some("23514") => "check violation",
                Some("22001") => "value too long",
                Some("22003") => "numeric value out of range",
                _ => "database error",
            };
            RepositoryError::storage(operation, format!("{}: {}", kind, db_err.message()))
        }
        sqlx::Error::PoolClosed => RepositoryError::storage(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => {
            RepositoryError::storage(operation, "timed out acquiring a connection")
        }
        sqlx::Error::RowNotFound => RepositoryError::storage(operation, "unexpected row not found"),
        other => RepositoryError::storage(operation, other.to_string()),
    }
}
