//! Error types for the PoSpace sector engine

use std::path::PathBuf;

/// Error types for the PoSpace sector engine
#[derive(Debug, thiserror::Error)]
pub enum SectorError {
    /// data_size is not a power of two
    #[error("invalid data size: {size} bytes (must be a power of two)")]
    InvalidDataSize { size: u64 },

    /// data_size too small for a two-level commitment
    #[error("data size too small: {size} bytes (meta region needs at least two entries)")]
    DataSizeTooSmall { size: u64 },

    /// Sector directory missing or not usable
    #[error("invalid sector path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Not enough free space to create the sector
    #[error("insufficient free space: need {needed} bytes, {available} available")]
    InsufficientSpace { needed: u64, available: u64 },

    /// A region file exists but has the wrong length
    #[error("size mismatch for {path:?}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// A stored root does not match its recomputation
    #[error("integrity failure: {0}")]
    Integrity(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for sector operations
pub type Result<T> = std::result::Result<T, SectorError>;
