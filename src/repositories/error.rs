//! Errori del layer repository

use super::value::ValueError;
use sqlx::error::ErrorKind;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row matched a key lookup or a find-or-fail query
    #[error("no `{table}` record found for {lookup}")]
    NotFound { table: &'static str, lookup: String },

    #[error("unknown column `{column}` on `{table}`")]
    UnknownColumn { table: &'static str, column: String },

    #[error("unknown relation `{relation}` on `{table}`")]
    UnknownRelation { table: &'static str, relation: String },

    #[error("invalid filter on `{column}`: {reason}")]
    InvalidFilter { column: String, reason: String },

    #[error(transparent)]
    InvalidValue(#[from] ValueError),

    #[error("`{table}` does not support soft deletes")]
    SoftDeletesUnsupported { table: &'static str },

    /// Count/aggregate query failure
    #[error("aggregate query on `{table}` failed")]
    Aggregate {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to (de)serialize a `{table}` record")]
    Serialization {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn not_found(table: &'static str, lookup: impl Into<String>) -> Self {
        Self::NotFound {
            table,
            lookup: lookup.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// MySQL errors raised by a value that does not fit its column
/// (1048 null, 1264 out of range, 1265 truncated, 1292 bad datetime, 1364 no default,
/// 1366 incorrect value, 1406 too long)
const DATA_ERRORS: &[u16] = &[1048, 1264, 1265, 1292, 1364, 1366, 1406];

/// Whether the engine refused the data itself (constraint violation or bad value)
/// rather than failing to run the statement. Write paths turn these into `None`/`false`;
/// deadlocks, lock timeouts, missing tables and the like are real failures.
pub fn is_rejection(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    match db_err.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => true,
        _ => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|mysql| DATA_ERRORS.contains(&mysql.number())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = RepositoryError::not_found("products", "product_id = 42");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no `products` record found for product_id = 42");
    }

    #[test]
    fn test_pool_errors_are_not_rejections() {
        assert!(!is_rejection(&sqlx::Error::PoolTimedOut));
        assert!(!is_rejection(&sqlx::Error::RowNotFound));
        assert!(!is_rejection(&sqlx::Error::PoolClosed));
        assert!(!is_rejection(&sqlx::Error::WorkerCrashed));
        assert!(!is_rejection(&sqlx::Error::ColumnNotFound("sku".to_string())));
        assert!(!is_rejection(&sqlx::Error::Protocol("unexpected packet".to_string())));
    }
}
