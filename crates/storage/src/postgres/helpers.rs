//! Shared helper functions for PostgreSQL errors and row conversion.

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::models::Role;

/// Classify a sqlx error.
///
/// Unique, foreign key and check violations become
/// `StorageError::ConstraintViolation`; pool exhaustion becomes
/// `ConnectionError`; decoding failures become `SerializationError`.
pub fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_foreign_key_violation()
                || db.is_check_violation() =>
        {
            StorageError::ConstraintViolation(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StorageError::ConnectionError(err.to_string())
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::SerializationError(err.to_string())
        }
        _ => StorageError::QueryError(err.to_string()),
    }
}

/// Map transaction begin/commit failures.
pub fn map_tx_error(err: sqlx::Error) -> StorageError {
    StorageError::TransactionError(err.to_string())
}

/// Fail with `NotFound` when a write touched no row.
pub fn expect_affected(rows: u64, table: &str, id: i64) -> StorageResult<()> {
    if rows == 0 {
        return Err(StorageError::NotFound(format!("{table} id={id}")));
    }
    Ok(())
}

/// Parse the role names stored in `user_roles`.
pub fn parse_roles(raw: Vec<String>, field_name: &str) -> StorageResult<Vec<Role>> {
    raw.into_iter()
        .map(|name| {
            name.parse::<Role>().map_err(|e| {
                StorageError::SerializationError(format!("{field_name}: {e}"))
            })
        })
        .collect()
}
