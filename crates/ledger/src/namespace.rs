//! Namespace registry
//!
//! Namespaces are the only partition the ledger needs to validate: a mutation
//! against an unknown (or archived) namespace fails with `NotFound`.

use crate::error::{LedgerError, LedgerResult};
use crate::services::ServiceContext;
use obol_core::{Namespace, NamespaceSettings, SettingsPatch};
use obol_persistence::NamespaceRepo;
use tracing::{debug, info};

pub struct NamespaceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NamespaceService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        tenant: &str,
        name: &str,
        description: Option<&str>,
    ) -> LedgerResult<Namespace> {
        let name = Namespace::validate_name(name)?;
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let settings = NamespaceSettings::default().to_json()?;

        let row =
            NamespaceRepo::insert(self.ctx.pool(), tenant, &name, description, &settings).await?;
        info!(tenant, namespace_id = row.id, name = %row.name, "namespace created");
        Ok(row.try_into()?)
    }

    /// Delete a namespace and its wallets. Ledger history is kept.
    pub async fn delete(&self, tenant: &str, id: i64) -> LedgerResult<()> {
        NamespaceRepo::delete(self.ctx.pool(), tenant, id)
            .await
            .map_err(|e| not_found_as_namespace(e.into(), tenant, id))?;
        info!(tenant, namespace_id = id, "namespace deleted");
        Ok(())
    }

    /// Active namespaces ordered by name
    pub async fn list(&self, tenant: &str) -> LedgerResult<Vec<Namespace>> {
        let rows = NamespaceRepo::list_active(self.ctx.pool(), tenant).await?;
        rows.into_iter()
            .map(|row| Namespace::try_from(row).map_err(LedgerError::from))
            .collect()
    }

    pub async fn get(&self, tenant: &str, id: i64) -> LedgerResult<Option<Namespace>> {
        match NamespaceRepo::get_by_id(self.ctx.pool(), tenant, id).await? {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_name(&self, tenant: &str, name: &str) -> LedgerResult<Option<Namespace>> {
        match NamespaceRepo::get_by_name(self.ctx.pool(), tenant, name.trim()).await? {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    /// Resolve free-form input: a numeric id, else a case-insensitive exact,
    /// prefix, then substring match on active namespace names.
    ///
    /// Only the id lookup can return an archived namespace; name matching
    /// sees active namespaces only. Restoring an archived namespace therefore
    /// needs its id.
    pub async fn resolve(&self, tenant: &str, input: &str) -> LedgerResult<Option<Namespace>> {
        let input = input.trim();
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            return match input.parse::<i64>() {
                Ok(id) => self.get(tenant, id).await,
                Err(_) => Ok(None),
            };
        }
        let all = self.list(tenant).await?;
        let found = match_name(&all, input).cloned();
        debug!(tenant, input, found = found.as_ref().map(|n| n.id), "namespace resolved");
        Ok(found)
    }

    /// Apply a settings patch; the merged settings are validated before they
    /// are stored. An empty patch returns the namespace without writing.
    pub async fn update_settings(
        &self,
        tenant: &str,
        id: i64,
        patch: SettingsPatch,
    ) -> LedgerResult<Namespace> {
        let current = self
            .get(tenant, id)
            .await?
            .ok_or_else(|| LedgerError::namespace_not_found(tenant, id))?;
        if patch.is_empty() {
            return Ok(current);
        }
        let next = current.settings.apply(patch)?;

        let row = NamespaceRepo::update_settings(self.ctx.pool(), tenant, id, &next.to_json()?)
            .await
            .map_err(|e| not_found_as_namespace(e.into(), tenant, id))?;
        info!(tenant, namespace_id = id, "namespace settings updated");
        Ok(row.try_into()?)
    }

    /// Archive (`false`) or restore (`true`) a namespace. Archived namespaces
    /// reject mutations and drop out of listings; their data stays.
    pub async fn set_active(&self, tenant: &str, id: i64, active: bool) -> LedgerResult<()> {
        NamespaceRepo::set_active(self.ctx.pool(), tenant, id, active)
            .await
            .map_err(|e| not_found_as_namespace(e.into(), tenant, id))?;
        info!(tenant, namespace_id = id, active, "namespace activity changed");
        Ok(())
    }

    /// The namespace, if it exists under `tenant` and is active
    pub async fn require_active(&self, tenant: &str, id: i64) -> LedgerResult<Namespace> {
        match self.get(tenant, id).await? {
            Some(ns) if ns.is_active => Ok(ns),
            _ => Err(LedgerError::namespace_not_found(tenant, id)),
        }
    }
}

fn not_found_as_namespace(err: LedgerError, tenant: &str, id: i64) -> LedgerError {
    if err.is_not_found() {
        LedgerError::namespace_not_found(tenant, id)
    } else {
        err
    }
}

/// Best name match: exact, then prefix, then substring (case-insensitive).
pub(crate) fn match_name<'n>(namespaces: &'n [Namespace], input: &str) -> Option<&'n Namespace> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let lowered: Vec<(String, &Namespace)> = namespaces
        .iter()
        .map(|ns| (ns.name.to_lowercase(), ns))
        .collect();

    lowered
        .iter()
        .find(|(name, _)| *name == needle)
        .or_else(|| lowered.iter().find(|(name, _)| name.starts_with(&needle)))
        .or_else(|| lowered.iter().find(|(name, _)| name.contains(&needle)))
        .map(|(_, ns)| *ns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(id: i64, name: &str) -> Namespace {
        Namespace {
            id,
            tenant: "t".to_string(),
            name: name.to_string(),
            description: None,
            settings: NamespaceSettings::default(),
            is_active: true,
        }
    }

    #[test]
    fn test_match_name_priority() {
        let all = vec![ns(1, "Chess Club"), ns(2, "Chess"), ns(3, "Speed Chess")];

        assert_eq!(match_name(&all, "chess").map(|n| n.id), Some(2));
        assert_eq!(match_name(&all, "CHESS c").map(|n| n.id), Some(1));
        assert_eq!(match_name(&all, "speed").map(|n| n.id), Some(3));
        assert_eq!(match_name(&all, "ess cl").map(|n| n.id), Some(1));
        assert!(match_name(&all, "poker").is_none());
        assert!(match_name(&all, "  ").is_none());
    }
}
