//! Rank service
//!
//! The single owner of the catalog and the principal rank store. Lifecycle:
//! `load → serve queries/mutations → reload (atomic swap) → shutdown
//! (final persist)`. All mutations are serialized through write locks;
//! readers never observe a half-updated catalog because reload builds the
//! replacement off-lock and swaps an `Arc`.

use crate::catalog::RankCatalog;
use crate::comparator;
use crate::config::ConfigSource;
use crate::display::{DisplayRankSynchronizer, PresentationSink, PrincipalDirectory};
use crate::error::{RankError, Result};
use crate::persist::PersistenceSink;
use crate::resolver;
use crate::store::{PrincipalRankMap, PrincipalRankStore};
use crate::types::{PermissionCheck, RankName};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

/// Concurrent display-sync jobs dispatched for join events
const MAX_JOIN_SYNC_JOBS: usize = 64;

/// Rank-based permission resolution service
pub struct RankService {
    catalog: RwLock<Arc<RankCatalog>>,
    store: RwLock<PrincipalRankStore>,
    config_source: Arc<dyn ConfigSource>,
    persistence: Arc<dyn PersistenceSink>,
    synchronizer: DisplayRankSynchronizer,
    join_jobs: Arc<Semaphore>,
}

impl RankService {
    /// Load the catalog and persisted grants and start serving
    pub async fn load(
        config_source: Arc<dyn ConfigSource>,
        persistence: Arc<dyn PersistenceSink>,
        directory: Arc<dyn PrincipalDirectory>,
        presentation: Arc<dyn PresentationSink>,
    ) -> Result<Self> {
        let catalog = config_source.load_rank_catalog().await?;
        let permanent = config_source.load_principal_ranks().await?;

        info!(
            "Rank service loaded: {} ranks, {} principals with permanent grants",
            catalog.len(),
            permanent.len()
        );

        Ok(Self {
            catalog: RwLock::new(Arc::new(catalog)),
            store: RwLock::new(PrincipalRankStore::with_permanent(permanent)),
            config_source,
            persistence,
            synchronizer: DisplayRankSynchronizer::new(directory, presentation),
            join_jobs: Arc::new(Semaphore::new(MAX_JOIN_SYNC_JOBS)),
        })
    }

    /// The single public permission entry point
    ///
    /// Never fails: a principal with no matching override resolves to
    /// `Unspecified` and the caller applies its own default policy.
    pub async fn check_permission(&self, principal_id: &str, permission: &str) -> PermissionCheck {
        debug!("Checking permission '{}' for {}", permission, principal_id);
        let catalog = self.current_catalog().await;
        let effective = self
            .store
            .read()
            .await
            .effective_ranks(principal_id, catalog.default_rank());
        resolver::resolve(&catalog, &effective, permission)
    }

    /// Grant a permanent rank; persists before returning success
    pub async fn grant_permanent(&self, principal_id: &str, rank: &str) -> Result<()> {
        let catalog = self.current_catalog().await;
        self.store
            .write()
            .await
            .grant_permanent(&catalog, principal_id, rank)?;
        info!("Granted permanent rank '{}' to {}", rank, principal_id);

        // The in-memory grant stays live even when the write failed, so
        // the display label is synced either way.
        let persisted = self.persist().await;
        self.sync_display(principal_id).await;
        persisted
    }

    /// Grant a session-only rank; never persisted
    pub async fn grant_session(&self, principal_id: &str, rank: &str) -> Result<()> {
        let catalog = self.current_catalog().await;
        self.store
            .write()
            .await
            .grant_session(&catalog, principal_id, rank)?;
        info!("Granted session rank '{}' to {}", rank, principal_id);

        self.sync_display(principal_id).await;
        Ok(())
    }

    /// Revoke a permanent rank
    ///
    /// Returns `Ok(false)` without persisting when the rank was not held.
    /// A successful revoke also drops the same session rank.
    pub async fn revoke_permanent(&self, principal_id: &str, rank: &str) -> Result<bool> {
        let removed = self
            .store
            .write()
            .await
            .revoke_permanent(principal_id, rank);
        if !removed {
            return Ok(false);
        }
        info!("Revoked permanent rank '{}' from {}", rank, principal_id);

        let persisted = self.persist().await;
        self.sync_display(principal_id).await;
        persisted.map(|()| true)
    }

    /// Revoke a session rank; true iff it was present
    pub async fn revoke_session(&self, principal_id: &str, rank: &str) -> bool {
        let removed = self.store.write().await.revoke_session(principal_id, rank);
        if removed {
            info!("Revoked session rank '{}' from {}", rank, principal_id);
            self.sync_display(principal_id).await;
        }
        removed
    }

    /// permanent ∪ session ∪ {default} for a principal
    pub async fn effective_ranks(&self, principal_id: &str) -> BTreeSet<RankName> {
        let catalog = self.current_catalog().await;
        self.store
            .read()
            .await
            .effective_ranks(principal_id, catalog.default_rank())
    }

    /// The principal's explicitly granted ranks: (permanent, session)
    pub async fn ranks_of(&self, principal_id: &str) -> (BTreeSet<RankName>, BTreeSet<RankName>) {
        let store = self.store.read().await;
        (
            store.permanent_ranks(principal_id).cloned().unwrap_or_default(),
            store.session_ranks(principal_id).cloned().unwrap_or_default(),
        )
    }

    /// All configured rank names in priority order
    pub async fn list_ranks(&self) -> Vec<RankName> {
        self.current_catalog().await.rank_names()
    }

    /// True iff `actor` outranks `target`; gates privileged mutations
    pub async fn outranks(&self, actor_id: &str, target_id: &str) -> bool {
        let catalog = self.current_catalog().await;
        let store = self.store.read().await;
        let actor = store.effective_ranks(actor_id, catalog.default_rank());
        let target = store.effective_ranks(target_id, catalog.default_rank());
        comparator::outranks(&catalog, &actor, &target)
    }

    /// Reload catalog and persisted grants
    ///
    /// Both files are loaded and validated before anything is swapped, so a
    /// malformed config leaves the previously loaded state fully intact.
    /// Session ranks survive a reload.
    pub async fn reload(&self) -> Result<()> {
        let new_catalog = self.config_source.load_rank_catalog().await?;
        let new_permanent = self.config_source.load_principal_ranks().await?;

        // Both guards are held across the swap so a concurrent reader
        // never pairs the new catalog with the old permanent map.
        let mut catalog = self.catalog.write().await;
        let mut store = self.store.write().await;
        *catalog = Arc::new(new_catalog);
        store.replace_permanent(new_permanent);

        info!("Rank service reloaded");
        Ok(())
    }

    /// Final persist before the hosting process exits
    pub async fn shutdown(&self) -> Result<()> {
        self.persist().await?;
        info!("Rank service shut down");
        Ok(())
    }

    /// Handle a principal join event
    ///
    /// Dispatches a bounded background job that re-syncs the display rank.
    /// The job tolerates the principal disconnecting before it runs: the
    /// synchronizer checks liveness before pushing.
    pub fn handle_join(self: &Arc<Self>, principal_id: impl Into<String>) {
        let principal_id = principal_id.into();
        let Ok(permit) = Arc::clone(&self.join_jobs).try_acquire_owned() else {
            debug!("Join sync queue full, skipping display sync for {}", principal_id);
            return;
        };

        let service = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = permit;
            service.sync_display(&principal_id).await;
        });
    }

    /// Snapshot of the current catalog
    pub async fn current_catalog(&self) -> Arc<RankCatalog> {
        Arc::clone(&*self.catalog.read().await)
    }

    async fn persist(&self) -> Result<()> {
        let snapshot: PrincipalRankMap = self.store.read().await.permanent_map().clone();
        if let Err(e) = self.persistence.save_principal_ranks(&snapshot).await {
            // In-memory state is not rolled back on a failed write.
            warn!("Failed to persist principal ranks: {}", e);
            return Err(RankError::Persistence(e.to_string()));
        }
        Ok(())
    }

    async fn sync_display(&self, principal_id: &str) {
        let catalog = self.current_catalog().await;
        let effective = self
            .store
            .read()
            .await
            .effective_ranks(principal_id, catalog.default_rank());
        self.synchronizer.sync(&catalog, principal_id, &effective).await;
    }
}
