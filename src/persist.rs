//! Persistence of permanent rank grants
//!
//! Permanent grants are written after every mutation; session grants are
//! never written. A write failure is reported but the in-memory state is
//! not rolled back: losing a grant on restart is less harmful than losing
//! it immediately.

use crate::error::{RankError, Result};
use crate::store::PrincipalRankMap;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Sink receiving the full permanent rank map after every mutation
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist the permanent rank map
    async fn save_principal_ranks(&self, ranks: &PrincipalRankMap) -> Result<()>;
}

/// Writes the permanent rank map as a YAML `principal -> [rank]` mapping
pub struct YamlFileSink {
    path: PathBuf,
}

impl YamlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this sink writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PersistenceSink for YamlFileSink {
    async fn save_principal_ranks(&self, ranks: &PrincipalRankMap) -> Result<()> {
        // Sorted output, principals with no remaining ranks omitted.
        let snapshot: BTreeMap<&String, &BTreeSet<String>> = ranks
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .collect();

        let yaml = serde_yaml::to_string(&snapshot)
            .map_err(|e| RankError::Persistence(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, yaml).await?;

        debug!("Persisted {} principal rank entries to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

/// Keeps the last saved map in memory, for embedding and tests
#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Option<PrincipalRankMap>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently saved map, if any save has happened
    pub async fn last_saved(&self) -> Option<PrincipalRankMap> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn save_principal_ranks(&self, ranks: &PrincipalRankMap) -> Result<()> {
        *self.saved.lock().await = Some(ranks.clone());
        Ok(())
    }
}
