//! Priority-ordered permission resolution
//!
//! Walks the catalog in priority order and returns the first explicit
//! allow/deny found among the ranks a principal effectively holds.

use crate::catalog::RankCatalog;
use crate::types::PermissionCheck;
use std::collections::BTreeSet;
use tracing::debug;

/// Resolve a permission against a principal's effective rank set
///
/// First match wins: the highest-priority rank carrying an explicit
/// override for `permission` decides. Ranks are consulted in catalog order;
/// the configured default rank is consulted even if the caller's set does
/// not contain it. An empty effective set short-circuits to `Unspecified`.
pub fn resolve(
    catalog: &RankCatalog,
    effective_ranks: &BTreeSet<String>,
    permission: &str,
) -> PermissionCheck {
    if effective_ranks.is_empty() {
        debug!("No effective ranks, permission '{}' unspecified", permission);
        return PermissionCheck::Unspecified;
    }

    for rank in catalog.ordered_ranks() {
        let held = effective_ranks.contains(&rank.name)
            || catalog.default_rank() == Some(rank.name.as_str());
        if !held {
            continue;
        }

        if let Some(allowed) = rank.overrides.get(permission) {
            let check = if *allowed {
                PermissionCheck::Allow
            } else {
                PermissionCheck::Deny
            };
            debug!("Permission '{}' resolved to {:?} by rank '{}'", permission, check, rank.name);
            return check;
        }
    }

    debug!("Permission '{}' unspecified, no rank had an opinion", permission);
    PermissionCheck::Unspecified
}
