//! SQL storage error types.

use sqlx::Error as SqlxError;
use ssp_storage::StorageError;

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Converts a `SQLx` error to a storage error.
///
/// `entity_type`, `field` and `value` describe the unique key being written,
/// so a unique violation can be reported as [`StorageError::Duplicate`].
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(
    err: SqlxError,
    entity_type: &'static str,
    field: &'static str,
    value: &str,
) -> StorageError {
    match err {
        SqlxError::RowNotFound => StorageError::Internal("Row not found".to_string()),
        SqlxError::Database(db_err) => {
            if db_err.code().is_some_and(|c| c == UNIQUE_VIOLATION) {
                StorageError::duplicate(entity_type, field, value)
            } else {
                StorageError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("Connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("Connection pool closed".to_string()),
        _ => StorageError::Internal(err.to_string()),
    }
}

/// Converts a `SQLx` error from a read-only query.
pub fn from_query_error(err: SqlxError) -> StorageError {
    from_sqlx_error(err, "LocalUser", "id", "")
}
