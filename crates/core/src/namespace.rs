//! # Namespace Module
//!
//! A namespace partitions a tenant's wallets (one per game, project, ...).
//! Its settings are a typed structure validated here, at the namespace
//! boundary; the ledger itself only ever sees the namespace id.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Longest accepted namespace name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Stored namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: i64,
    pub tenant: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: NamespaceSettings,
    pub is_active: bool,
}

impl Namespace {
    /// Trims and checks a user supplied name.
    pub fn validate_name(name: &str) -> CoreResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidNamespaceName(
                "name cannot be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::InvalidNamespaceName(format!(
                "name longer than {} characters",
                MAX_NAME_LEN
            )));
        }
        Ok(trimmed.to_string())
    }
}

/// Per-namespace configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSettings {
    /// Roles allowed to grant tokens
    pub grant_role_ids: Vec<String>,
    /// Roles allowed to manage the namespace
    pub manager_role_ids: Vec<String>,
    /// Channel that receives mutation logs
    pub log_channel_id: Option<String>,
}

impl NamespaceSettings {
    /// Parses the stored JSON form. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::InvalidSettings(e.to_string()))
    }

    pub fn validate(&self) -> CoreResult<()> {
        check_ids("grant_role_ids", &self.grant_role_ids)?;
        check_ids("manager_role_ids", &self.manager_role_ids)?;
        if let Some(channel) = &self.log_channel_id {
            check_id("log_channel_id", channel)?;
        }
        Ok(())
    }

    /// Applies a patch and returns the validated result. `self` is left
    /// untouched when validation fails.
    pub fn apply(&self, patch: SettingsPatch) -> CoreResult<Self> {
        let mut next = self.clone();
        if let Some(ids) = patch.grant_role_ids {
            next.grant_role_ids = normalize_ids(ids);
        }
        if let Some(ids) = patch.manager_role_ids {
            next.manager_role_ids = normalize_ids(ids);
        }
        if let Some(channel) = patch.log_channel_id {
            next.log_channel_id = channel.map(|c| c.trim().to_string());
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update for [`NamespaceSettings`].
///
/// `None` leaves a field unchanged. For `log_channel_id`, `Some(None)` clears
/// the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub grant_role_ids: Option<Vec<String>>,
    pub manager_role_ids: Option<Vec<String>>,
    pub log_channel_id: Option<Option<String>>,
}

impl SettingsPatch {
    pub fn grant_roles(ids: Vec<String>) -> Self {
        Self {
            grant_role_ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn manager_roles(ids: Vec<String>) -> Self {
        Self {
            manager_role_ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn log_channel(channel: Option<String>) -> Self {
        Self {
            log_channel_id: Some(channel),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grant_role_ids.is_none()
            && self.manager_role_ids.is_none()
            && self.log_channel_id.is_none()
    }
}

// Trim, drop blanks, dedupe keeping first occurrence.
fn normalize_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim().to_string();
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn check_ids(field: &str, ids: &[String]) -> CoreResult<()> {
    for (i, id) in ids.iter().enumerate() {
        check_id(field, id)?;
        if ids[..i].contains(id) {
            return Err(CoreError::InvalidSettings(format!(
                "{}: duplicate id {}",
                field, id
            )));
        }
    }
    Ok(())
}

fn check_id(field: &str, id: &str) -> CoreResult<()> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidSettings(format!(
            "{}: invalid id {:?}",
            field, id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(Namespace::validate_name("  Chess ").unwrap(), "Chess");
        assert!(Namespace::validate_name("   ").is_err());
        assert!(Namespace::validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_settings_defaults_from_partial_json() {
        let settings = NamespaceSettings::from_json(r#"{"grant_role_ids":["r1"]}"#).unwrap();
        assert_eq!(settings.grant_role_ids, vec!["r1".to_string()]);
        assert!(settings.manager_role_ids.is_empty());
        assert_eq!(settings.log_channel_id, None);

        assert_eq!(
            NamespaceSettings::from_json("{}").unwrap(),
            NamespaceSettings::default()
        );
    }

    #[test]
    fn test_settings_rejects_garbage() {
        assert!(NamespaceSettings::from_json("not json").is_err());
        assert!(NamespaceSettings::from_json(r#"{"grant_role_ids":["a b"]}"#).is_err());
        assert!(NamespaceSettings::from_json(r#"{"manager_role_ids":["a","a"]}"#).is_err());
    }

    #[test]
    fn test_settings_patch() {
        let base = NamespaceSettings::default();
        let next = base
            .apply(SettingsPatch::grant_roles(vec![
                " r1 ".to_string(),
                "r2".to_string(),
                "r1".to_string(),
                "".to_string(),
            ]))
            .unwrap();
        assert_eq!(next.grant_role_ids, vec!["r1", "r2"]);
        assert!(next.manager_role_ids.is_empty());

        let next = next
            .apply(SettingsPatch::log_channel(Some("c9".to_string())))
            .unwrap();
        assert_eq!(next.log_channel_id.as_deref(), Some("c9"));
        assert_eq!(next.grant_role_ids, vec!["r1", "r2"]);

        let cleared = next.apply(SettingsPatch::log_channel(None)).unwrap();
        assert_eq!(cleared.log_channel_id, None);

        assert!(next
            .apply(SettingsPatch::log_channel(Some("  ".to_string())))
            .is_err());
    }

    #[test]
    fn test_settings_json_roundtrip_shape() {
        let settings = NamespaceSettings {
            grant_role_ids: vec!["g".to_string()],
            manager_role_ids: vec![],
            log_channel_id: Some("c".to_string()),
        };
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"log_channel_id\":\"c\""));
        assert_eq!(NamespaceSettings::from_json(&json).unwrap(), settings);
    }
}
