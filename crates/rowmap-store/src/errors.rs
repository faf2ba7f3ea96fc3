//! Error handling for rowmap-store
//!
//! rusqlite errors are classified here and nowhere else.

use rowmap_core::errors::PersistenceError;
use rusqlite::ErrorCode;

/// Result type alias using PersistenceError
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Create a store error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> PersistenceError {
    PersistenceError::Store {
        op: "sqlite".to_string(),
        message: err.to_string(),
    }
}

/// Classify a rusqlite error raised while operating on one entity
///
/// Primary-key, foreign-key, NOT NULL, UNIQUE and CHECK failures all carry
/// SQLite's `SQLITE_CONSTRAINT` primary code.
pub fn for_entity<'a>(
    entity: &'a str,
    op: &'a str,
) -> impl FnOnce(rusqlite::Error) -> PersistenceError + 'a {
    move |err| match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == ErrorCode::ConstraintViolation =>
        {
            PersistenceError::ConstraintViolation {
                entity: entity.to_string(),
                message: message.clone().unwrap_or_else(|| err.to_string()),
            }
        }
        _ => PersistenceError::Store {
            op: op.to_string(),
            message: err.to_string(),
        },
    }
}
