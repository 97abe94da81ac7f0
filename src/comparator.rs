//! Rank comparison for authorization gating
//!
//! Determines whether one principal's highest-priority rank outranks
//! another's. This is the sole gate for rank mutations on a target
//! principal: an actor may only grant/revoke when it outranks the target.

use crate::catalog::RankCatalog;
use std::collections::BTreeSet;

/// True iff `actor`'s highest-priority rank is strictly above `target`'s
///
/// An actor with no ranks never outranks anyone. An actor with ranks
/// outranks a target with none. Otherwise the catalog is walked in
/// priority order and the first principal whose set matches wins; a tie on
/// the same rank means the target is equal-or-higher, so the result is
/// false. If no catalog rank matches either set, neither outranks.
pub fn outranks(
    catalog: &RankCatalog,
    actor_ranks: &BTreeSet<String>,
    target_ranks: &BTreeSet<String>,
) -> bool {
    if actor_ranks.is_empty() {
        return false;
    }
    if target_ranks.is_empty() {
        return true;
    }

    for rank in catalog.ordered_ranks() {
        if target_ranks.contains(&rank.name) {
            return false;
        }
        if actor_ranks.contains(&rank.name) {
            return true;
        }
    }
    false
}
