//! Balance mutations - grant, remove, set
//!
//! Each mutation runs in one store transaction that updates the wallet and
//! appends its ledger row; either both commit or neither does.
//!
//! Same-wallet writers are serialized by the store: the first statement of
//! the transaction is the wallet upsert, which takes SQLite's write lock
//! before the balance is read. The balance update is also a compare-and-swap
//! on the value read. Lock contention or a lost CAS rolls back and retries,
//! up to `LedgerConfig::max_retries` attempts.

use crate::error::{LedgerError, LedgerResult};
use crate::namespace::NamespaceService;
use crate::services::{ServiceContext, TransactionResult};
use obol_core::{Mutation, Wallet, WalletKey};
use obol_persistence::{NewTransaction, PersistenceError, TransactionRepo, WalletRepo};
use tracing::{info, warn};

/// Mutation Service - the only writer of wallets and ledger rows
pub struct MutationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MutationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add `amount` to the target's balance
    pub async fn grant(
        &self,
        tenant: &str,
        namespace_id: i64,
        actor: &str,
        target: &str,
        amount: i64,
        reason: Option<&str>,
    ) -> LedgerResult<TransactionResult> {
        let key = WalletKey::new(tenant, namespace_id, target);
        self.apply(&key, actor, Mutation::Grant(amount), reason).await
    }

    /// Subtract `amount`; fails with `InsufficientBalance` rather than going
    /// below zero
    pub async fn remove(
        &self,
        tenant: &str,
        namespace_id: i64,
        actor: &str,
        target: &str,
        amount: i64,
        reason: Option<&str>,
    ) -> LedgerResult<TransactionResult> {
        let key = WalletKey::new(tenant, namespace_id, target);
        self.apply(&key, actor, Mutation::Remove(amount), reason).await
    }

    /// Overwrite the balance with `new_balance`
    pub async fn set(
        &self,
        tenant: &str,
        namespace_id: i64,
        actor: &str,
        target: &str,
        new_balance: i64,
        reason: Option<&str>,
    ) -> LedgerResult<TransactionResult> {
        let key = WalletKey::new(tenant, namespace_id, target);
        self.apply(&key, actor, Mutation::Set(new_balance), reason)
            .await
    }

    /// Existing wallet, or a new one at balance 0
    pub async fn ensure_wallet(
        &self,
        tenant: &str,
        namespace_id: i64,
        subject: &str,
    ) -> LedgerResult<Wallet> {
        NamespaceService::new(self.ctx)
            .require_active(tenant, namespace_id)
            .await?;
        let key = WalletKey::new(tenant, namespace_id, subject);
        let row = WalletRepo::ensure(self.ctx.pool(), &key)
            .await
            .map_err(|e| missing_namespace(e, &key))?;
        Ok(row.into())
    }

    /// Validate, then run the mutation with bounded contention retries.
    pub async fn apply(
        &self,
        key: &WalletKey,
        actor: &str,
        mutation: Mutation,
        reason: Option<&str>,
    ) -> LedgerResult<TransactionResult> {
        mutation.validate()?;
        NamespaceService::new(self.ctx)
            .require_active(&key.tenant, key.namespace_id)
            .await?;

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let max_retries = self.ctx.config().max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = self.try_apply(key, actor, mutation, reason).await;
            let retryable = match &outcome {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => e.is_contention(),
            };

            if !retryable {
                let result = outcome?.ok_or(LedgerError::Contention { attempts: attempt })?;
                info!(
                    wallet = %key,
                    actor,
                    action = %result.action,
                    amount = mutation.amount(),
                    before = result.before(),
                    after = result.after(),
                    transaction_id = result.transaction_id,
                    "balance mutation committed"
                );
                return Ok(result);
            }

            if attempt >= max_retries {
                warn!(wallet = %key, attempts = attempt, "giving up on contended mutation");
                return Err(LedgerError::Contention { attempts: attempt });
            }
            warn!(wallet = %key, attempt, "write contention, retrying mutation");
            tokio::time::sleep(self.ctx.config().retry_backoff * attempt).await;
        }
    }

    /// One attempt. `Ok(None)` means the compare-and-swap lost.
    async fn try_apply(
        &self,
        key: &WalletKey,
        actor: &str,
        mutation: Mutation,
        reason: Option<&str>,
    ) -> LedgerResult<Option<TransactionResult>> {
        let mut tx = self.ctx.pool().begin().await?;

        let wallet = WalletRepo::ensure(&mut *tx, key)
            .await
            .map_err(|e| missing_namespace(e, key))?;

        // Dropping `tx` on any early return rolls back.
        let change = mutation.apply(wallet.balance)?;

        if !WalletRepo::compare_and_swap(&mut *tx, wallet.id, change.before, change.after).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = NewTransaction::new(key, actor, mutation, change, reason);
        let transaction_id = TransactionRepo::insert(&mut *tx, &row).await?;

        tx.commit().await?;

        Ok(Some(TransactionResult {
            transaction_id,
            action: mutation.action(),
            change,
        }))
    }
}

// The namespace can disappear between the registry check and the upsert.
fn missing_namespace(err: PersistenceError, key: &WalletKey) -> LedgerError {
    if err.is_foreign_key_violation() {
        LedgerError::namespace_not_found(&key.tenant, key.namespace_id)
    } else {
        err.into()
    }
}
