//! Principal rank storage
//!
//! Maps principal IDs to their permanent (persisted) and session
//! (ephemeral) rank sets. Entries are created lazily on first grant.
//! Rank names referencing definitions that later disappear from the
//! catalog are kept; they simply never match during resolution.

use crate::catalog::RankCatalog;
use crate::error::{RankError, Result};
use crate::types::{PrincipalId, RankName};
use std::collections::{BTreeSet, HashMap};

/// Mapping from principal ID to a set of rank names
pub type PrincipalRankMap = HashMap<PrincipalId, BTreeSet<RankName>>;

/// In-memory permanent + session rank sets per principal
#[derive(Debug, Default)]
pub struct PrincipalRankStore {
    permanent: PrincipalRankMap,
    session: PrincipalRankMap,
}

impl PrincipalRankStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with persisted permanent ranks
    pub fn with_permanent(permanent: PrincipalRankMap) -> Self {
        Self {
            permanent,
            session: PrincipalRankMap::new(),
        }
    }

    /// Grant a permanent rank
    ///
    /// Fails if the rank is not in the catalog. Granting an already-held
    /// rank succeeds as a no-op (set semantics).
    pub fn grant_permanent(
        &mut self,
        catalog: &RankCatalog,
        principal_id: &str,
        rank: &str,
    ) -> Result<()> {
        if !catalog.exists(rank) {
            return Err(RankError::UnknownRank(rank.to_string()));
        }
        self.permanent
            .entry(principal_id.to_string())
            .or_default()
            .insert(rank.to_string());
        Ok(())
    }

    /// Grant a session-only rank, same validation as a permanent grant
    pub fn grant_session(
        &mut self,
        catalog: &RankCatalog,
        principal_id: &str,
        rank: &str,
    ) -> Result<()> {
        if !catalog.exists(rank) {
            return Err(RankError::UnknownRank(rank.to_string()));
        }
        self.session
            .entry(principal_id.to_string())
            .or_default()
            .insert(rank.to_string());
        Ok(())
    }

    /// Revoke a permanent rank
    ///
    /// Returns true iff the rank was present and removed. On success the
    /// same rank is also dropped from the session set, so a duplicate
    /// session grant cannot survive a permanent revoke.
    pub fn revoke_permanent(&mut self, principal_id: &str, rank: &str) -> bool {
        let removed = Self::remove_from(&mut self.permanent, principal_id, rank);
        if removed {
            Self::remove_from(&mut self.session, principal_id, rank);
        }
        removed
    }

    /// Revoke a session rank; true iff it was present and removed
    pub fn revoke_session(&mut self, principal_id: &str, rank: &str) -> bool {
        Self::remove_from(&mut self.session, principal_id, rank)
    }

    /// Drop all session ranks (disconnect/restart semantics)
    pub fn clear_sessions(&mut self) {
        self.session.clear();
    }

    /// Replace the permanent map wholesale (reload), keeping session ranks
    pub fn replace_permanent(&mut self, permanent: PrincipalRankMap) {
        self.permanent = permanent;
    }

    /// permanent ∪ session ∪ {default}, computed fresh on every call
    pub fn effective_ranks(&self, principal_id: &str, default_rank: Option<&str>) -> BTreeSet<RankName> {
        let mut ranks = BTreeSet::new();
        if let Some(permanent) = self.permanent.get(principal_id) {
            ranks.extend(permanent.iter().cloned());
        }
        if let Some(session) = self.session.get(principal_id) {
            ranks.extend(session.iter().cloned());
        }
        if let Some(default) = default_rank {
            ranks.insert(default.to_string());
        }
        ranks
    }

    /// The principal's permanent ranks, if any were granted
    pub fn permanent_ranks(&self, principal_id: &str) -> Option<&BTreeSet<RankName>> {
        self.permanent.get(principal_id)
    }

    /// The principal's session ranks, if any were granted
    pub fn session_ranks(&self, principal_id: &str) -> Option<&BTreeSet<RankName>> {
        self.session.get(principal_id)
    }

    /// Full permanent map, the unit of persistence
    pub fn permanent_map(&self) -> &PrincipalRankMap {
        &self.permanent
    }

    fn remove_from(map: &mut PrincipalRankMap, principal_id: &str, rank: &str) -> bool {
        let Some(ranks) = map.get_mut(principal_id) else {
            return false;
        };
        let removed = ranks.remove(rank);
        if ranks.is_empty() {
            map.remove(principal_id);
        }
        removed
    }
}
