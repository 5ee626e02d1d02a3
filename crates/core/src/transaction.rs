//! # Transaction Module
//!
//! Append-only audit rows and the balance arithmetic that produces them.

use crate::error::{CoreError, CoreResult};
use crate::wallet::BalanceChange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of balance mutation recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxAction {
    Grant,
    Remove,
    Set,
}

impl TxAction {
    /// Code string stored in the `action` column
    pub fn as_str(&self) -> &'static str {
        match self {
            TxAction::Grant => "grant",
            TxAction::Remove => "remove",
            TxAction::Set => "set",
        }
    }
}

impl FromStr for TxAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grant" => Ok(TxAction::Grant),
            "remove" => Ok(TxAction::Remove),
            "set" => Ok(TxAction::Set),
            other => Err(CoreError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for TxAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested balance mutation.
///
/// The wrapped value is the magnitude for `Grant`/`Remove` and the target
/// balance for `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Grant(i64),
    Remove(i64),
    Set(i64),
}

impl Mutation {
    pub fn action(&self) -> TxAction {
        match self {
            Mutation::Grant(_) => TxAction::Grant,
            Mutation::Remove(_) => TxAction::Remove,
            Mutation::Set(_) => TxAction::Set,
        }
    }

    /// Value as requested by the caller (stored in `amount`)
    pub fn amount(&self) -> i64 {
        match *self {
            Mutation::Grant(v) | Mutation::Remove(v) | Mutation::Set(v) => v,
        }
    }

    /// Rejects negative amounts before any storage access.
    pub fn validate(&self) -> CoreResult<()> {
        let amount = self.amount();
        if amount < 0 {
            return Err(match self {
                Mutation::Set(_) => CoreError::InvalidAmount(format!(
                    "balance cannot be negative, got {}",
                    amount
                )),
                _ => CoreError::negative_amount(amount),
            });
        }
        Ok(())
    }

    /// Computes the resulting balance from the current one.
    pub fn apply(&self, before: i64) -> CoreResult<BalanceChange> {
        self.validate()?;
        let after = match *self {
            Mutation::Grant(amount) => before.checked_add(amount).ok_or_else(|| {
                CoreError::InvalidAmount(format!("grant of {} overflows balance {}", amount, before))
            })?,
            Mutation::Remove(amount) => {
                let after = before - amount;
                if after < 0 {
                    return Err(CoreError::InsufficientBalance {
                        requested: amount,
                        available: before,
                    });
                }
                after
            }
            Mutation::Set(balance) => balance,
        };
        Ok(BalanceChange::new(before, after))
    }
}

/// Immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub tenant: String,
    pub namespace_id: i64,
    pub actor_subject: String,
    pub target_subject: String,
    pub action: TxAction,
    pub amount: i64,
    pub delta: i64,
    pub before: i64,
    pub after: i64,
    pub reason: Option<String>,
}

impl Transaction {
    pub fn change(&self) -> BalanceChange {
        BalanceChange::new(self.before, self.after)
    }

    /// `after = before + delta` and `after >= 0`
    pub fn is_consistent(&self) -> bool {
        self.after == self.before + self.delta && self.after >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_str() {
        assert_eq!(TxAction::Grant.as_str(), "grant");
        assert_eq!("REMOVE".parse::<TxAction>().unwrap(), TxAction::Remove);
        assert_eq!(" set ".parse::<TxAction>().unwrap(), TxAction::Set);
        assert!("transfer".parse::<TxAction>().is_err());
    }

    #[test]
    fn test_grant_apply() {
        let change = Mutation::Grant(10).apply(0).unwrap();
        assert_eq!(change, BalanceChange::new(0, 10));
        assert_eq!(change.delta(), 10);

        assert!(Mutation::Grant(-1).apply(0).unwrap_err().is_invalid_amount());
        assert!(Mutation::Grant(1).apply(i64::MAX).unwrap_err().is_invalid_amount());
    }

    #[test]
    fn test_remove_apply() {
        let change = Mutation::Remove(3).apply(10).unwrap();
        assert_eq!(change, BalanceChange::new(10, 7));
        assert_eq!(change.delta(), -3);

        assert_eq!(
            Mutation::Remove(100).apply(5).unwrap_err(),
            CoreError::InsufficientBalance {
                requested: 100,
                available: 5
            }
        );
        assert_eq!(Mutation::Remove(5).apply(5).unwrap().after, 0);
    }

    #[test]
    fn test_set_apply_is_idempotent() {
        let first = Mutation::Set(5).apply(7).unwrap();
        assert_eq!(first.delta(), -2);

        let second = Mutation::Set(5).apply(first.after).unwrap();
        assert_eq!(second, BalanceChange::new(5, 5));
        assert_eq!(second.delta(), 0);

        assert!(Mutation::Set(-1).apply(0).unwrap_err().is_invalid_amount());
    }

    #[test]
    fn test_zero_amounts_are_valid() {
        assert_eq!(Mutation::Grant(0).apply(4).unwrap().delta(), 0);
        assert_eq!(Mutation::Remove(0).apply(0).unwrap().delta(), 0);
    }
}
