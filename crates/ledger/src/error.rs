//! Ledger errors
//!
//! The taxonomy callers match on. Domain validation failures come from
//! `obol_core::CoreError`, storage failures from `PersistenceError`.

use obol_core::CoreError;
use obol_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    // === Validation errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Invalid namespace name: {0}")]
    InvalidName(String),

    #[error("Invalid namespace settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    // === Lookup errors ===
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: String, id: String },

    // === Storage errors ===
    #[error("Storage failure: {0}")]
    StorageFailure(#[source] PersistenceError),

    #[error("Storage failure: write contention not resolved after {attempts} attempts")]
    Contention { attempts: u32 },
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn namespace_not_found(tenant: &str, namespace_id: i64) -> Self {
        Self::not_found("Namespace", &format!("{}/{}", tenant, namespace_id))
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::InsufficientBalance { .. })
    }

    pub fn is_invalid_amount(&self) -> bool {
        matches!(self, Self::InvalidAmount(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure(_) | Self::Contention { .. })
    }

    /// Retryable lock contention reported by the store
    pub(crate) fn is_contention(&self) -> bool {
        matches!(self, Self::StorageFailure(e) if e.is_contention())
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            CoreError::InsufficientBalance {
                requested,
                available,
            } => Self::InsufficientBalance {
                requested,
                available,
            },
            CoreError::InvalidAction(msg) => Self::InvalidAction(msg),
            CoreError::InvalidNamespaceName(msg) => Self::InvalidName(msg),
            CoreError::InvalidSettings(msg) => Self::InvalidSettings(msg),
        }
    }
}

impl From<PersistenceError> for LedgerError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } => Self::NotFound { entity, id },
            PersistenceError::AlreadyExists { entity, id } => Self::AlreadyExists { entity, id },
            other => Self::StorageFailure(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        PersistenceError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_taxonomy() {
        let err: LedgerError = CoreError::InsufficientBalance {
            requested: 100,
            available: 5,
        }
        .into();
        assert!(err.is_insufficient_balance());
        assert_eq!(
            err.to_string(),
            "Insufficient balance: requested 100, available 5"
        );

        let err: LedgerError = CoreError::negative_amount(-1).into();
        assert!(err.is_invalid_amount());
    }

    #[test]
    fn test_persistence_errors_map_to_taxonomy() {
        let err: LedgerError = PersistenceError::not_found("Namespace", "9").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Namespace not found: 9");

        let err: LedgerError = sqlx::Error::RowNotFound.into();
        assert!(err.is_storage_failure());
        assert!(!err.is_contention());

        assert!(LedgerError::Contention { attempts: 3 }.is_storage_failure());
    }
}
