//! CLI command handlers

pub mod audit;
pub mod namespace;
pub mod wallet;

use anyhow::{anyhow, Result};
use obol_core::Namespace;
use obol_ledger::{NamespaceService, ServiceContext};
use obol_persistence::Database;
use std::path::Path;

use crate::db;

/// Everything a command needs: the open database, services and who is asking
pub struct Session {
    db: Database,
    pub ctx: ServiceContext,
    pub tenant: String,
    pub actor: String,
}

impl Session {
    pub async fn open(db_path: &Path, tenant: &str, actor: &str) -> Result<Self> {
        let db = db::connect(db_path).await?;
        let ctx = ServiceContext::new(&db);
        Ok(Self {
            db,
            ctx,
            tenant: tenant.to_string(),
            actor: actor.to_string(),
        })
    }

    /// Resolve a namespace id or (partial) name, or fail with a hint
    pub async fn namespace(&self, input: &str) -> Result<Namespace> {
        NamespaceService::new(&self.ctx)
            .resolve(&self.tenant, input)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "Namespace '{}' not found in tenant '{}'. See 'obol namespace list'.",
                    input,
                    self.tenant
                )
            })
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Shorten a string for table output
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
