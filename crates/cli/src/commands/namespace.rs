//! Namespace management commands

use anyhow::{bail, Result};
use obol_core::{Namespace, SettingsPatch};
use obol_ledger::NamespaceService;

use super::{truncate, Session};
use crate::NamespaceAction;

pub async fn handle(session: &Session, action: NamespaceAction) -> Result<()> {
    let namespaces = NamespaceService::new(&session.ctx);
    let tenant = session.tenant.as_str();

    match action {
        NamespaceAction::Create { name, description } => {
            let ns = namespaces
                .create(tenant, &name, description.as_deref())
                .await?;
            println!("✅ Namespace created!");
            println!("   ID:   {}", ns.id);
            println!("   Name: {}", ns.name);
        }

        NamespaceAction::List => {
            let all = namespaces.list(tenant).await?;
            if all.is_empty() {
                println!("No namespaces in tenant '{}'.", tenant);
                return Ok(());
            }
            println!("{:<6} {:<32} {:<40}", "ID", "NAME", "DESCRIPTION");
            println!("{}", "-".repeat(80));
            for ns in all {
                println!(
                    "{:<6} {:<32} {:<40}",
                    ns.id,
                    truncate(&ns.name, 32),
                    truncate(ns.description.as_deref().unwrap_or("-"), 40)
                );
            }
        }

        NamespaceAction::Show { namespace } => {
            let ns = session.namespace(&namespace).await?;
            print_namespace(&ns)?;
        }

        NamespaceAction::Delete { namespace } => {
            let ns = session.namespace(&namespace).await?;
            namespaces.delete(tenant, ns.id).await?;
            println!("🗑️  Deleted namespace {} ({}); its history is kept", ns.name, ns.id);
        }

        NamespaceAction::Config {
            namespace,
            settings,
        } => {
            let ns = session.namespace(&namespace).await?;
            let patch = parse_settings(&settings)?;
            let updated = namespaces.update_settings(tenant, ns.id, patch).await?;
            println!("✅ Settings updated");
            print_namespace(&updated)?;
        }

        NamespaceAction::Archive { namespace } => {
            let ns = session.namespace(&namespace).await?;
            namespaces.set_active(tenant, ns.id, false).await?;
            println!("📦 Archived namespace {} ({})", ns.name, ns.id);
        }

        NamespaceAction::Restore { id } => {
            namespaces.set_active(tenant, id, true).await?;
            println!("✅ Restored namespace {}", id);
        }
    }

    Ok(())
}

fn print_namespace(ns: &Namespace) -> Result<()> {
    println!("📁 Namespace {}", ns.name);
    println!("   ID:          {}", ns.id);
    println!("   Tenant:      {}", ns.tenant);
    println!(
        "   Description: {}",
        ns.description.as_deref().unwrap_or("-")
    );
    println!("   Active:      {}", ns.is_active);
    println!("   Settings:");
    println!("{}", serde_json::to_string_pretty(&ns.settings)?);
    Ok(())
}

/// Parse `key=value` pairs into a settings patch.
///
/// Keys: `grantRoles`, `managerRoles` (comma-separated ids, empty clears)
/// and `logChannel` (`null` or empty clears).
pub(crate) fn parse_settings(pairs: &[String]) -> Result<SettingsPatch> {
    let mut patch = SettingsPatch::default();

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{}'", pair);
        };
        let value = value.trim();
        match key.trim() {
            "grantRoles" => patch.grant_role_ids = Some(split_ids(value)),
            "managerRoles" => patch.manager_role_ids = Some(split_ids(value)),
            "logChannel" => {
                patch.log_channel_id = Some(match value {
                    "" | "null" => None,
                    channel => Some(channel.to_string()),
                })
            }
            other => bail!(
                "Unknown setting '{}' (expected grantRoles, managerRoles or logChannel)",
                other
            ),
        }
    }

    Ok(patch)
}

fn split_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
