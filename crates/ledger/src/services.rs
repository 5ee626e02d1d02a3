//! Service context and shared result types

use obol_core::{BalanceChange, TxAction};
use obol_persistence::Database;
use sqlx::SqlitePool;
use std::time::Duration;

/// Tunables for the ledger services.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Attempts per mutation before giving up on write contention
    pub max_retries: u32,
    /// Base delay between attempts, multiplied by the attempt number
    pub retry_backoff: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

/// Context for ledger operations - owns database access
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pool: SqlitePool,
    config: LedgerConfig,
}

impl ServiceContext {
    pub fn new(db: &Database) -> Self {
        Self::from_pool(db.pool().clone())
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            config: LedgerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

/// Outcome of a committed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionResult {
    pub transaction_id: i64,
    pub action: TxAction,
    pub change: BalanceChange,
}

impl TransactionResult {
    pub fn before(&self) -> i64 {
        self.change.before
    }

    pub fn after(&self) -> i64 {
        self.change.after
    }

    pub fn delta(&self) -> i64 {
        self.change.delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_result() {
        let result = TransactionResult {
            transaction_id: 3,
            action: TxAction::Set,
            change: BalanceChange::new(7, 5),
        };
        assert_eq!(result.before(), 7);
        assert_eq!(result.after(), 5);
        assert_eq!(result.delta(), -2);
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.max_retries, 5);
        assert!(config.retry_backoff > Duration::ZERO);
    }
}
