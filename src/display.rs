//! Display-rank synchronization
//!
//! Recomputes the externally visible rank label whenever a principal's
//! effective rank set changes and pushes it to the hosting environment's
//! own presentation system. The push is best-effort: an offline principal
//! is a no-op, not an error.

use crate::catalog::RankCatalog;
use crate::types::PrincipalId;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to an online principal in the hosting environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalHandle {
    /// Principal identifier
    pub id: PrincipalId,
}

impl PrincipalHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Lookup of currently connected principals
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Returns a handle iff the principal is currently online
    async fn find_online(&self, principal_id: &str) -> Option<PrincipalHandle>;
}

/// External presentation system receiving display labels
#[async_trait]
pub trait PresentationSink: Send + Sync {
    /// Push a display label for an online principal
    async fn set_display_rank(
        &self,
        handle: &PrincipalHandle,
        label: &str,
    ) -> std::result::Result<(), String>;
}

/// Directory for hosts without a presence system: everyone is online
pub struct AlwaysOnlineDirectory;

#[async_trait]
impl PrincipalDirectory for AlwaysOnlineDirectory {
    async fn find_online(&self, principal_id: &str) -> Option<PrincipalHandle> {
        Some(PrincipalHandle::new(principal_id))
    }
}

/// Presentation sink that only logs the push, for hosts without one
pub struct LoggingPresentationSink;

#[async_trait]
impl PresentationSink for LoggingPresentationSink {
    async fn set_display_rank(
        &self,
        handle: &PrincipalHandle,
        label: &str,
    ) -> std::result::Result<(), String> {
        info!("Display rank for {} set to '{}'", handle.id, label);
        Ok(())
    }
}

/// Pushes the highest-priority display label a principal qualifies for
pub struct DisplayRankSynchronizer {
    directory: Arc<dyn PrincipalDirectory>,
    presentation: Arc<dyn PresentationSink>,
}

impl DisplayRankSynchronizer {
    pub fn new(
        directory: Arc<dyn PrincipalDirectory>,
        presentation: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            directory,
            presentation,
        }
    }

    /// Recompute and push the principal's display label
    ///
    /// Walks the catalog in priority order; the first rank held effectively
    /// (or equal to the default rank) that carries a display label wins.
    /// If no rank in the walk carries a label, nothing is pushed and the
    /// previous label is left untouched.
    pub async fn sync(
        &self,
        catalog: &RankCatalog,
        principal_id: &str,
        effective_ranks: &BTreeSet<String>,
    ) {
        if effective_ranks.is_empty() {
            return;
        }

        let Some(label) = Self::pick_label(catalog, effective_ranks) else {
            debug!("No display rank configured for any rank held by {}", principal_id);
            return;
        };

        // Liveness check before the external push: disconnected is a no-op.
        let Some(handle) = self.directory.find_online(principal_id).await else {
            debug!("Principal {} is offline, skipping display rank push", principal_id);
            return;
        };

        if let Err(e) = self.presentation.set_display_rank(&handle, label).await {
            warn!("Failed to push display rank for {}: {}", principal_id, e);
        } else {
            debug!("Pushed display rank '{}' for {}", label, principal_id);
        }
    }

    fn pick_label<'a>(
        catalog: &'a RankCatalog,
        effective_ranks: &BTreeSet<String>,
    ) -> Option<&'a str> {
        for rank in catalog.ordered_ranks() {
            let held = effective_ranks.contains(&rank.name)
                || catalog.default_rank() == Some(rank.name.as_str());
            if !held {
                continue;
            }
            if let Some(label) = rank.display_rank.as_deref() {
                if !label.is_empty() {
                    return Some(label);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RankDefinition;
    use tokio::sync::Mutex;

    struct RecordingSink {
        pushes: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                pushes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PresentationSink for RecordingSink {
        async fn set_display_rank(
            &self,
            handle: &PrincipalHandle,
            label: &str,
        ) -> std::result::Result<(), String> {
            self.pushes
                .lock()
                .await
                .push((handle.id.clone(), label.to_string()));
            Ok(())
        }
    }

    struct OfflineDirectory;

    #[async_trait]
    impl PrincipalDirectory for OfflineDirectory {
        async fn find_online(&self, _principal_id: &str) -> Option<PrincipalHandle> {
            None
        }
    }

    fn catalog() -> RankCatalog {
        RankCatalog::new(
            vec![
                RankDefinition::new("owner").with_display_rank("Owner"),
                RankDefinition::new("admin"),
                RankDefinition::new("default").with_display_rank("Member"),
            ],
            Some("default".to_string()),
        )
    }

    fn ranks(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_highest_priority_label_pushed() {
        let sink = Arc::new(RecordingSink::new());
        let sync = DisplayRankSynchronizer::new(Arc::new(AlwaysOnlineDirectory), sink.clone());

        sync.sync(&catalog(), "alice", &ranks(&["owner", "admin"])).await;

        let pushes = sink.pushes.lock().await;
        assert_eq!(pushes.as_slice(), &[("alice".to_string(), "Owner".to_string())]);
    }

    #[tokio::test]
    async fn test_default_label_used_when_held_rank_has_none() {
        let sink = Arc::new(RecordingSink::new());
        let sync = DisplayRankSynchronizer::new(Arc::new(AlwaysOnlineDirectory), sink.clone());

        // admin has no label; the default rank's label applies.
        sync.sync(&catalog(), "bob", &ranks(&["admin"])).await;

        let pushes = sink.pushes.lock().await;
        assert_eq!(pushes.as_slice(), &[("bob".to_string(), "Member".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_set_pushes_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let sync = DisplayRankSynchronizer::new(Arc::new(AlwaysOnlineDirectory), sink.clone());

        sync.sync(&catalog(), "carol", &BTreeSet::new()).await;

        assert!(sink.pushes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_offline_principal_is_a_noop() {
        let sink = Arc::new(RecordingSink::new());
        let sync = DisplayRankSynchronizer::new(Arc::new(OfflineDirectory), sink.clone());

        sync.sync(&catalog(), "dave", &ranks(&["owner"])).await;

        assert!(sink.pushes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_label_anywhere_leaves_previous_untouched() {
        let catalog = RankCatalog::new(
            vec![RankDefinition::new("admin"), RankDefinition::new("vip")],
            None,
        );
        let sink = Arc::new(RecordingSink::new());
        let sync = DisplayRankSynchronizer::new(Arc::new(AlwaysOnlineDirectory), sink.clone());

        sync.sync(&catalog, "erin", &ranks(&["admin", "vip"])).await;

        assert!(sink.pushes.lock().await.is_empty());
    }
}
