//! # rankperms
//!
//! Rank-based permission resolution engine.
//!
//! Principals hold permanent (persisted) and session (ephemeral) ranks
//! drawn from an ordered catalog. Each rank carries a sparse permission
//! override table; a check walks the catalog in priority order and the
//! first explicit allow/deny wins, yielding a tri-state result.
//!
//! ## Features
//!
//! - **Tri-state checks**: allow, deny, or unspecified (caller's default)
//! - **First-match-wins** priority-ordered resolution
//! - **Rank comparison** gating of administrative mutations
//! - **Display-rank synchronization** to an external presentation system
//! - **Atomic reload**: a malformed config never disturbs the running state
//!
//! ## Example
//!
//! ```no_run
//! use rankperms::{
//!     config::FileConfigSource,
//!     display::{AlwaysOnlineDirectory, LoggingPresentationSink},
//!     persist::YamlFileSink,
//!     PermissionCheck, RankService,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(FileConfigSource::new("config.yml", "principal_ranks.yml"));
//!     let service = RankService::load(
//!         config,
//!         Arc::new(YamlFileSink::new("principal_ranks.yml")),
//!         Arc::new(AlwaysOnlineDirectory),
//!         Arc::new(LoggingPresentationSink),
//!     )
//!     .await?;
//!
//!     service.grant_permanent("alice", "admin").await?;
//!
//!     if service.check_permission("alice", "kick").await == PermissionCheck::Allow {
//!         println!("alice may kick");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod commands;
pub mod comparator;
pub mod config;
pub mod display;
pub mod error;
pub mod persist;
pub mod resolver;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use catalog::RankCatalog;
pub use commands::{AllowAllGate, AuthorizationGate, CommandContext, COMMANDS};
pub use comparator::outranks;
pub use config::{ConfigSource, FileConfigSource};
pub use display::{DisplayRankSynchronizer, PresentationSink, PrincipalDirectory, PrincipalHandle};
pub use error::{RankError, Result};
pub use persist::{MemorySink, PersistenceSink, YamlFileSink};
pub use resolver::resolve;
pub use service::RankService;
pub use store::{PrincipalRankMap, PrincipalRankStore};
pub use types::{PermissionCheck, PermissionName, PrincipalId, RankDefinition, RankName};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
