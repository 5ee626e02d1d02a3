//! # Error Module
//!
//! Domain errors for the ledger, independent of any storage backend.

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // === Amount errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    // === Action errors ===
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    // === Namespace errors ===
    #[error("Invalid namespace name: {0}")]
    InvalidNamespaceName(String),

    #[error("Invalid namespace settings: {0}")]
    InvalidSettings(String),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Negative amount helper
    pub fn negative_amount(amount: i64) -> Self {
        Self::InvalidAmount(format!("amount must be >= 0, got {}", amount))
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, CoreError::InsufficientBalance { .. })
    }

    pub fn is_invalid_amount(&self) -> bool {
        matches!(self, CoreError::InvalidAmount(_))
    }
}
