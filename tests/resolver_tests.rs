//! Resolution and comparison behavior against a fixed catalog
//!
//! Covers first-match-wins ordering, tri-state results, default-rank
//! handling and the conservative comparator semantics.

use proptest::prelude::*;
use rankperms::{outranks, resolve, PermissionCheck, RankCatalog, RankDefinition};
use std::collections::BTreeSet;

fn scenario_catalog() -> RankCatalog {
    RankCatalog::new(
        vec![
            RankDefinition::new("owner").with_override("kick", true),
            RankDefinition::new("admin").with_override("kick", false),
            RankDefinition::new("default"),
        ],
        Some("default".to_string()),
    )
}

fn ranks(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn admin_is_denied_kick() {
    assert_eq!(
        resolve(&scenario_catalog(), &ranks(&["admin"]), "kick"),
        PermissionCheck::Deny
    );
}

#[test]
fn owner_overrides_admin_deny() {
    // owner is checked first, its allow wins over admin's deny
    assert_eq!(
        resolve(&scenario_catalog(), &ranks(&["owner", "admin"]), "kick"),
        PermissionCheck::Allow
    );
}

#[test]
fn default_rank_without_entry_is_unspecified() {
    // A principal with only the implicit default rank, which carries no
    // "kick" entry.
    assert_eq!(
        resolve(&scenario_catalog(), &ranks(&["default"]), "kick"),
        PermissionCheck::Unspecified
    );
}

#[test]
fn empty_effective_set_is_unspecified() {
    assert_eq!(
        resolve(&scenario_catalog(), &BTreeSet::new(), "kick"),
        PermissionCheck::Unspecified
    );
}

#[test]
fn comparator_is_irreflexive_on_equal_sets() {
    let catalog = scenario_catalog();
    let set = ranks(&["owner", "admin"]);
    assert!(!outranks(&catalog, &set, &set));

    let single = ranks(&["admin"]);
    assert!(!outranks(&catalog, &single, &single));
}

#[test]
fn comparator_orders_by_catalog_position() {
    let catalog = scenario_catalog();
    assert!(outranks(&catalog, &ranks(&["owner"]), &ranks(&["admin"])));
    assert!(!outranks(&catalog, &ranks(&["admin"]), &ranks(&["owner"])));
    assert!(outranks(&catalog, &ranks(&["admin"]), &ranks(&["default"])));
}

proptest! {
    /// A permission mentioned by no rank resolves to Unspecified no matter
    /// which ranks the principal holds.
    #[test]
    fn unknown_permission_always_unspecified(
        member_owner in any::<bool>(),
        member_admin in any::<bool>(),
        member_default in any::<bool>(),
        suffix in "[a-z]{1,16}",
    ) {
        let catalog = scenario_catalog();
        let mut set = BTreeSet::new();
        if member_owner {
            set.insert("owner".to_string());
        }
        if member_admin {
            set.insert("admin".to_string());
        }
        if member_default {
            set.insert("default".to_string());
        }

        // No rank in the catalog mentions any "unmapped.*" permission.
        let permission = format!("unmapped.{}", suffix);
        prop_assert_eq!(
            resolve(&catalog, &set, &permission),
            PermissionCheck::Unspecified
        );
    }

    /// An empty effective set never resolves to anything but Unspecified.
    #[test]
    fn empty_set_unspecified_for_any_permission(permission in "[a-z.]{1,24}") {
        let catalog = scenario_catalog();
        prop_assert_eq!(
            resolve(&catalog, &BTreeSet::new(), &permission),
            PermissionCheck::Unspecified
        );
    }
}
