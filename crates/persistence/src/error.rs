//! # Persistence Errors
//!
//! Error types for the persistence layer, wrapping sqlx and row decoding
//! failures.

use thiserror::Error;

/// SQLite primary/extended result codes that mean "another writer holds the
/// lock"; the operation can be retried.
const CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    // === Database errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity} with id {id}")]
    AlreadyExists { entity: String, id: String },

    // === Conversion errors ===
    #[error("Invalid enum value: {field} = {value}")]
    InvalidEnumValue { field: String, value: String },

    #[error("Invalid stored data: {0}")]
    InvalidData(#[from] obol_core::CoreError),
}

/// Result type alias for PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &str, id: &str) -> Self {
        Self::AlreadyExists {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Lock contention with a concurrent writer (`SQLITE_BUSY` family).
    pub fn is_contention(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db
                .code()
                .map(|code| CONTENTION_CODES.contains(&code.as_ref()))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// A referenced row (e.g. the namespace of a wallet) does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(db)) if db.is_foreign_key_violation())
    }
}

/// True when `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_helpers() {
        let err = PersistenceError::not_found("Namespace", "7");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Record not found: Namespace with id 7");
        assert!(!err.is_contention());

        let err = PersistenceError::Database(sqlx::Error::RowNotFound);
        assert!(err.is_database_error());
        assert!(!err.is_contention());
    }
}
