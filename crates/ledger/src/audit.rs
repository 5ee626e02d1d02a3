//! Audit trail queries
//!
//! Keyset pagination over the ledger; see `obol_core::page` for the cursor
//! and `has_prev`/`has_next` rules.

use crate::error::{LedgerError, LedgerResult};
use crate::services::ServiceContext;
use obol_core::{AuditFilter, Page, PageRequest, Transaction, WalletKey};
use obol_persistence::TransactionRepo;
use tracing::debug;

pub struct AuditService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuditService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of matching transactions, newest first
    pub async fn list_transactions_paged(
        &self,
        filter: &AuditFilter,
        request: &PageRequest,
    ) -> LedgerResult<Page<Transaction>> {
        let rows = TransactionRepo::list_page(self.ctx.pool(), filter, request).await?;
        let items = rows
            .into_iter()
            .map(|row| Transaction::try_from(row).map_err(LedgerError::from))
            .collect::<LedgerResult<Vec<_>>>()?;

        let page = Page::assemble(items, request, |tx| tx.id);
        debug!(
            tenant = %filter.tenant,
            scan = ?request.scan(),
            items = page.items.len(),
            has_prev = page.has_prev,
            has_next = page.has_next,
            "audit page"
        );
        Ok(page)
    }

    /// Full history of one wallet, oldest first
    pub async fn wallet_history(&self, key: &WalletKey) -> LedgerResult<Vec<Transaction>> {
        TransactionRepo::get_by_wallet(self.ctx.pool(), key)
            .await?
            .into_iter()
            .map(|row| Transaction::try_from(row).map_err(LedgerError::from))
            .collect()
    }
}
