// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Constraint translation: turns storage-level violations into the API taxonomy
// ---

/// Maps a unique violation to `Conflict(on_unique)`, everything else to a
/// plain database error.
pub(crate) fn unique_violation(e: sqlx::Error, on_unique: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::conflict(on_unique);
        }
    }
    e.into()
}

/// Maps a foreign-key violation to `NotFound(on_missing)`. Used where the
/// statement references ids supplied by the caller.
pub(crate) fn missing_reference(e: sqlx::Error, on_missing: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return AppError::not_found(on_missing);
        }
    }
    e.into()
}

/// Maps a foreign-key violation on delete to `Conflict(on_referenced)`: the row
/// is still in use.
pub(crate) fn still_referenced(e: sqlx::Error, on_referenced: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return AppError::conflict(on_referenced);
        }
    }
    e.into()
}

/// Insert into a table with both a unique key and a caller-supplied foreign
/// key: unique violations become `Conflict`, foreign-key ones `NotFound`.
pub(crate) fn insert_violation(e: sqlx::Error, on_unique: &str, on_missing: &str) -> AppError {
    match unique_violation(e, on_unique) {
        AppError::DatabaseError(e) => missing_reference(e, on_missing),
        mapped => mapped,
    }
}
