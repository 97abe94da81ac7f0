//! Ordered rank catalog
//!
//! Source of truth for rank existence, priority ordering, permission
//! overrides and display labels. Loaded wholesale from configuration and
//! immutable between reloads; a reload swaps the entire catalog.

use crate::types::{RankDefinition, RankName};
use std::collections::HashMap;
use tracing::warn;

/// Ordered list of rank definitions, most privileged first
#[derive(Debug, Clone, Default)]
pub struct RankCatalog {
    ranks: Vec<RankDefinition>,
    index: HashMap<RankName, usize>,
    default_rank: Option<RankName>,
}

impl RankCatalog {
    /// Build a catalog from already-ordered definitions
    ///
    /// A duplicate rank name keeps the first occurrence; later duplicates
    /// are dropped with a warning.
    pub fn new(ranks: Vec<RankDefinition>, default_rank: Option<String>) -> Self {
        let mut deduped: Vec<RankDefinition> = Vec::with_capacity(ranks.len());
        let mut index = HashMap::with_capacity(ranks.len());

        for rank in ranks {
            if index.contains_key(&rank.name) {
                warn!("Duplicate rank '{}' in catalog, keeping first occurrence", rank.name);
                continue;
            }
            index.insert(rank.name.clone(), deduped.len());
            deduped.push(rank);
        }

        if let Some(default) = &default_rank {
            if !index.contains_key(default) {
                warn!("Default rank '{}' is not defined in the catalog", default);
            }
        }

        Self {
            ranks: deduped,
            index,
            default_rank,
        }
    }

    /// Catalog with no ranks and no default
    pub fn empty() -> Self {
        Self::default()
    }

    /// True iff a rank with this exact name is present
    pub fn exists(&self, rank: &str) -> bool {
        self.index.contains_key(rank)
    }

    /// Ranks in configured priority order, highest privilege first
    pub fn ordered_ranks(&self) -> &[RankDefinition] {
        &self.ranks
    }

    /// Explicit allow/deny for a permission under a rank, if any
    ///
    /// Absent if the rank is unknown or has no opinion on the permission.
    pub fn permission_override(&self, rank: &str, permission: &str) -> Option<bool> {
        let idx = *self.index.get(rank)?;
        self.ranks[idx].overrides.get(permission).copied()
    }

    /// Display label configured for a rank, if any
    pub fn display_rank_for(&self, rank: &str) -> Option<&str> {
        let idx = *self.index.get(rank)?;
        self.ranks[idx].display_rank.as_deref()
    }

    /// The implicit rank applied to every principal, if configured
    pub fn default_rank(&self) -> Option<&str> {
        self.default_rank.as_deref()
    }

    /// All rank names in priority order
    pub fn rank_names(&self) -> Vec<String> {
        self.ranks.iter().map(|r| r.name.clone()).collect()
    }

    /// Number of ranks
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// True if the catalog has no ranks
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
