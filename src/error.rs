//! Error types for the rank permission engine

use thiserror::Error;

/// Rank engine errors
#[derive(Debug, Error)]
pub enum RankError {
    /// Malformed catalog or principal-rank configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Grant/revoke referencing a rank absent from the catalog
    #[error("Unknown rank: {0}")]
    UnknownRank(String),

    /// Persistence write failed; in-memory state is kept
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rank engine operations
pub type Result<T> = std::result::Result<T, RankError>;
