//! Core rank and permission types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rank name, also the catalog/config key (case-sensitive)
pub type RankName = String;

/// Principal identifier
pub type PrincipalId = String;

/// Permission node name
pub type PermissionName = String;

/// Tri-state result of a permission check
///
/// `Unspecified` means no rank held by the principal carries an explicit
/// override for the permission; callers apply their own default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionCheck {
    /// An explicit allow override matched
    Allow,
    /// An explicit deny override matched
    Deny,
    /// No rank had an opinion
    Unspecified,
}

impl PermissionCheck {
    /// True only for an explicit allow
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// True only for an explicit deny
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny)
    }
}

/// A single rank definition
///
/// Priority is not stored here: it is the rank's position in the catalog's
/// ordered list, most privileged first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDefinition {
    /// Unique rank name
    pub name: RankName,

    /// Sparse permission overrides: present = explicit allow/deny,
    /// absent = no opinion
    #[serde(default)]
    pub overrides: HashMap<PermissionName, bool>,

    /// External display label carried by principals holding this rank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_rank: Option<String>,
}

impl RankDefinition {
    /// Create a rank with no overrides and no display label
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: HashMap::new(),
            display_rank: None,
        }
    }

    /// Add an explicit allow/deny override
    pub fn with_override(mut self, permission: impl Into<String>, allowed: bool) -> Self {
        self.overrides.insert(permission.into(), allowed);
        self
    }

    /// Set the display label
    pub fn with_display_rank(mut self, label: impl Into<String>) -> Self {
        self.display_rank = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_definition_builder() {
        let rank = RankDefinition::new("moderator")
            .with_override("kick", true)
            .with_override("ban", false)
            .with_display_rank("Moderator");

        assert_eq!(rank.name, "moderator");
        assert_eq!(rank.overrides.get("kick"), Some(&true));
        assert_eq!(rank.overrides.get("ban"), Some(&false));
        assert_eq!(rank.overrides.get("mute"), None);
        assert_eq!(rank.display_rank.as_deref(), Some("Moderator"));
    }

    #[test]
    fn test_permission_check_predicates() {
        assert!(PermissionCheck::Allow.is_allowed());
        assert!(!PermissionCheck::Deny.is_allowed());
        assert!(PermissionCheck::Deny.is_denied());
        assert!(!PermissionCheck::Unspecified.is_allowed());
        assert!(!PermissionCheck::Unspecified.is_denied());
    }
}
