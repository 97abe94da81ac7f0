//! Configuration loading
//!
//! The catalog is a YAML document whose `ranks` mapping order defines rank
//! priority, most privileged first. Override values are parsed once at
//! load time; a value that cannot be interpreted as a boolean is dropped
//! with a warning so one bad entry never blocks other ranks' answers.
//! Persisted principal ranks are a flat YAML `principal -> [rank]` mapping.

use crate::catalog::RankCatalog;
use crate::error::{RankError, Result};
use crate::store::PrincipalRankMap;
use crate::types::RankDefinition;
use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Catalog written on first start when no config file exists yet
pub const DEFAULT_CATALOG: &str = "\
# Rank catalog. Mapping order is priority order, most privileged first.
default_rank: default

ranks:
  owner:
    display_rank: \"Owner\"
    permissions:
      rankperms.grant: true
      rankperms.revoke: true
      rankperms.reload: true
  admin:
    display_rank: \"Admin\"
    permissions:
      rankperms.grant: true
      rankperms.revoke: true
      rankperms.reload: false
  default:
    permissions:
      rankperms.listranks: true
";

/// Source of the rank catalog and persisted principal ranks
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Load the full rank catalog, including the default rank
    async fn load_rank_catalog(&self) -> Result<RankCatalog>;

    /// Load the persisted permanent rank grants
    async fn load_principal_ranks(&self) -> Result<PrincipalRankMap>;
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    default_rank: Option<String>,
    #[serde(default)]
    ranks: serde_yaml::Mapping,
}

/// Parse a catalog document
///
/// Mapping order is preserved as priority order. Rank entries may be empty
/// (`null`) or carry `display_rank` and `permissions` keys.
pub fn parse_catalog(yaml: &str) -> Result<RankCatalog> {
    let raw: RawCatalog =
        serde_yaml::from_str(yaml).map_err(|e| RankError::Config(e.to_string()))?;

    let mut ranks = Vec::with_capacity(raw.ranks.len());
    for (key, value) in &raw.ranks {
        let Some(name) = key.as_str() else {
            return Err(RankError::Config(format!(
                "rank name must be a string, got: {:?}",
                key
            )));
        };
        ranks.push(parse_rank(name, value)?);
    }

    // An empty default_rank string means "no implicit rank".
    let default_rank = raw.default_rank.filter(|s| !s.is_empty());

    Ok(RankCatalog::new(ranks, default_rank))
}

fn parse_rank(name: &str, value: &Value) -> Result<RankDefinition> {
    let mut rank = RankDefinition::new(name);

    let Value::Mapping(fields) = value else {
        if value.is_null() {
            return Ok(rank);
        }
        return Err(RankError::Config(format!(
            "rank '{}' must be a mapping or null",
            name
        )));
    };

    if let Some(label) = fields.get("display_rank") {
        match label.as_str() {
            Some(s) if !s.is_empty() => rank.display_rank = Some(s.to_string()),
            Some(_) => {}
            None => warn!("Ignoring non-string display_rank for rank '{}'", name),
        }
    }

    if let Some(Value::Mapping(permissions)) = fields.get("permissions") {
        for (perm_key, perm_value) in permissions {
            let Some(permission) = perm_key.as_str() else {
                warn!("Ignoring non-string permission name under rank '{}'", name);
                continue;
            };
            match parse_override_value(perm_value) {
                Some(allowed) => {
                    rank.overrides.insert(permission.to_string(), allowed);
                }
                None => {
                    // One malformed entry means this rank has no opinion on
                    // the permission; resolution continues with other ranks.
                    warn!(
                        "Ignoring unparseable override '{}' for rank '{}': {:?}",
                        permission, name, perm_value
                    );
                }
            }
        }
    } else if fields.get("permissions").is_some() {
        warn!("Ignoring non-mapping permissions section for rank '{}'", name);
    }

    Ok(rank)
}

/// Interpret a YAML value as an allow/deny override
///
/// Accepts booleans, `"true"`/`"false"` strings (case-insensitive) and the
/// integers 0/1. Anything else is no opinion.
fn parse_override_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Parse persisted principal ranks; an empty document is an empty map
pub fn parse_principal_ranks(yaml: &str) -> Result<PrincipalRankMap> {
    let parsed: Option<PrincipalRankMap> =
        serde_yaml::from_str(yaml).map_err(|e| RankError::Config(e.to_string()))?;
    Ok(parsed.unwrap_or_default())
}

/// Loads the catalog and principal ranks from YAML files on disk
pub struct FileConfigSource {
    catalog_path: PathBuf,
    principal_ranks_path: PathBuf,
}

impl FileConfigSource {
    pub fn new(catalog_path: impl Into<PathBuf>, principal_ranks_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            principal_ranks_path: principal_ranks_path.into(),
        }
    }

    /// Path the persisted principal ranks are read from (and written to)
    pub fn principal_ranks_path(&self) -> &Path {
        &self.principal_ranks_path
    }

    /// Write the bundled default catalog if no catalog file exists yet
    pub async fn ensure_catalog_exists(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.catalog_path).await? {
            return Ok(());
        }
        if let Some(parent) = self.catalog_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.catalog_path, DEFAULT_CATALOG).await?;
        info!("Wrote default catalog to {}", self.catalog_path.display());
        Ok(())
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn load_rank_catalog(&self) -> Result<RankCatalog> {
        let yaml = tokio::fs::read_to_string(&self.catalog_path)
            .await
            .map_err(|e| {
                RankError::Config(format!(
                    "cannot read catalog {}: {}",
                    self.catalog_path.display(),
                    e
                ))
            })?;
        let catalog = parse_catalog(&yaml)?;
        info!(
            "Loaded catalog with {} ranks from {}",
            catalog.len(),
            self.catalog_path.display()
        );
        Ok(catalog)
    }

    async fn load_principal_ranks(&self) -> Result<PrincipalRankMap> {
        if !tokio::fs::try_exists(&self.principal_ranks_path).await? {
            debug!(
                "No principal rank file at {}, starting empty",
                self.principal_ranks_path.display()
            );
            return Ok(PrincipalRankMap::new());
        }
        let yaml = tokio::fs::read_to_string(&self.principal_ranks_path).await?;
        let ranks = parse_principal_ranks(&yaml)?;
        info!(
            "Loaded {} principal rank entries from {}",
            ranks.len(),
            self.principal_ranks_path.display()
        );
        Ok(ranks)
    }
}
