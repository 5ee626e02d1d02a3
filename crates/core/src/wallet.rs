//! # Wallet Module
//!
//! A wallet is the balance of one subject inside one namespace of one tenant.
//! Wallets are created lazily on first reference and never hold a negative
//! balance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key identifying a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletKey {
    pub tenant: String,
    pub namespace_id: i64,
    pub subject: String,
}

impl WalletKey {
    pub fn new(tenant: &str, namespace_id: i64, subject: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            namespace_id,
            subject: subject.to_string(),
        }
    }
}

impl fmt::Display for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.namespace_id, self.subject)
    }
}

/// Stored wallet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub tenant: String,
    pub namespace_id: i64,
    pub subject: String,
    pub balance: i64,
}

impl Wallet {
    pub fn key(&self) -> WalletKey {
        WalletKey::new(&self.tenant, self.namespace_id, &self.subject)
    }
}

/// Balance before and after a committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub before: i64,
    pub after: i64,
}

impl BalanceChange {
    pub fn new(before: i64, after: i64) -> Self {
        Self { before, after }
    }

    /// Signed change actually applied (`after - before`)
    pub fn delta(&self) -> i64 {
        self.after - self.before
    }
}

impl fmt::Display for BalanceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({:+})", self.before, self.after, self.delta())
    }
}

/// A subject's positive balance in one namespace, joined with the
/// namespace's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectBalance {
    pub namespace_id: i64,
    pub namespace_name: String,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_change_delta() {
        assert_eq!(BalanceChange::new(7, 5).delta(), -2);
        assert_eq!(BalanceChange::new(0, 10).delta(), 10);
        assert_eq!(BalanceChange::new(5, 5).delta(), 0);
        assert_eq!(BalanceChange::new(7, 5).to_string(), "7 -> 5 (-2)");
    }

    #[test]
    fn test_wallet_key() {
        let wallet = Wallet {
            id: 1,
            tenant: "guild-1".to_string(),
            namespace_id: 3,
            subject: "alice".to_string(),
            balance: 0,
        };
        assert_eq!(wallet.key(), WalletKey::new("guild-1", 3, "alice"));
        assert_eq!(wallet.key().to_string(), "guild-1/3/alice");
    }
}
