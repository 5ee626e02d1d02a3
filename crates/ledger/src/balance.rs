//! Read-only balance queries

use crate::error::LedgerResult;
use crate::services::ServiceContext;
use obol_core::{SubjectBalance, Wallet, WalletKey, MAX_PAGE_LIMIT};
use obol_persistence::WalletRepo;
use tracing::debug;

/// Largest leaderboard a caller can ask for.
pub const MAX_TOP_LIMIT: u32 = MAX_PAGE_LIMIT;

pub struct BalanceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BalanceService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Stored balance, 0 for a wallet never referenced. Never creates one.
    pub async fn get_balance(
        &self,
        tenant: &str,
        namespace_id: i64,
        subject: &str,
    ) -> LedgerResult<i64> {
        let key = WalletKey::new(tenant, namespace_id, subject);
        let balance = WalletRepo::get_balance(self.ctx.pool(), &key).await?;
        debug!(wallet = %key, balance, "balance lookup");
        Ok(balance)
    }

    /// Highest balances first; ties ordered by subject
    pub async fn top_balances(
        &self,
        tenant: &str,
        namespace_id: i64,
        limit: u32,
    ) -> LedgerResult<Vec<Wallet>> {
        let limit = limit.clamp(1, MAX_TOP_LIMIT);
        let rows = WalletRepo::top(self.ctx.pool(), tenant, namespace_id, limit).await?;
        Ok(rows.into_iter().map(Wallet::from).collect())
    }

    /// Every active namespace where `subject` holds a positive balance,
    /// ordered by namespace name
    pub async fn list_balances_for_subject(
        &self,
        tenant: &str,
        subject: &str,
    ) -> LedgerResult<Vec<SubjectBalance>> {
        let rows = WalletRepo::list_for_subject(self.ctx.pool(), tenant, subject).await?;
        Ok(rows.into_iter().map(SubjectBalance::from).collect())
    }
}
