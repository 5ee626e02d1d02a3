//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables.
//! The schema itself lives in `migrations/20261019000000_init.sql`.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use obol_core::{
    BalanceChange, Mutation, Namespace, NamespaceSettings, SubjectBalance, Transaction, TxAction,
    Wallet, WalletKey,
};
use serde::{Deserialize, Serialize};

/// Row type for the `namespaces` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct NamespaceRow {
    pub id: i64,
    pub tenant: String,
    pub name: String,
    pub description: Option<String>,
    pub settings_json: String,
    pub is_active: bool,
}

/// Row type for the `wallets` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WalletRow {
    pub id: i64,
    pub tenant: String,
    pub namespace_id: i64,
    pub subject: String,
    pub balance: i64,
}

/// Row type for the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub tenant: String,
    pub namespace_id: i64,
    pub actor_subject: String,
    pub target_subject: String,
    pub action: String,
    pub amount: i64,
    pub delta: i64,
    pub before_balance: i64,
    pub after_balance: i64,
    pub reason: Option<String>,
}

/// Result row of the per-subject balance listing
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SubjectBalanceRow {
    pub namespace_id: i64,
    pub namespace_name: String,
    pub balance: i64,
}

/// Values for a ledger insert; `id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub ts: DateTime<Utc>,
    pub tenant: String,
    pub namespace_id: i64,
    pub actor_subject: String,
    pub target_subject: String,
    pub action: TxAction,
    pub amount: i64,
    pub delta: i64,
    pub before_balance: i64,
    pub after_balance: i64,
    pub reason: Option<String>,
}

impl NewTransaction {
    pub fn new(
        key: &WalletKey,
        actor_subject: &str,
        mutation: Mutation,
        change: BalanceChange,
        reason: Option<&str>,
    ) -> Self {
        Self {
            ts: Utc::now(),
            tenant: key.tenant.clone(),
            namespace_id: key.namespace_id,
            actor_subject: actor_subject.to_string(),
            target_subject: key.subject.clone(),
            action: mutation.action(),
            amount: mutation.amount(),
            delta: change.delta(),
            before_balance: change.before,
            after_balance: change.after,
            reason: reason.map(str::to_string),
        }
    }
}

// === Conversion implementations ===

impl TryFrom<NamespaceRow> for Namespace {
    type Error = PersistenceError;

    fn try_from(row: NamespaceRow) -> PersistenceResult<Self> {
        Ok(Self {
            settings: NamespaceSettings::from_json(&row.settings_json)?,
            id: row.id,
            tenant: row.tenant,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
        })
    }
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Self {
            id: row.id,
            tenant: row.tenant,
            namespace_id: row.namespace_id,
            subject: row.subject,
            balance: row.balance,
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> PersistenceResult<Self> {
        let action = row
            .action
            .parse::<TxAction>()
            .map_err(|_| PersistenceError::InvalidEnumValue {
                field: "action".to_string(),
                value: row.action.clone(),
            })?;
        Ok(Self {
            id: row.id,
            timestamp: row.ts,
            tenant: row.tenant,
            namespace_id: row.namespace_id,
            actor_subject: row.actor_subject,
            target_subject: row.target_subject,
            action,
            amount: row.amount,
            delta: row.delta,
            before: row.before_balance,
            after: row.after_balance,
            reason: row.reason,
        })
    }
}

impl From<SubjectBalanceRow> for SubjectBalance {
    fn from(row: SubjectBalanceRow) -> Self {
        Self {
            namespace_id: row.namespace_id,
            namespace_name: row.namespace_name,
            balance: row.balance,
        }
    }
}
