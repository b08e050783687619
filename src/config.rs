//! Centralized configuration for the PoSpace sector engine.
//!
//! This module contains constants and default parameters used throughout the
//! crate to ensure consistency and ease of modification.

// --- Item and Sector Geometry ---

/// Size of a sector item in bytes (eight 32-bit words).
pub const ITEM_SIZE_BYTES: usize = 32;

/// Smallest supported `data_size`. Below this the meta region would hold a
/// single entry and the two-level commitment degenerates.
pub const MIN_DATA_SIZE: u64 = 1 << 11;

// --- Sector Size Units ---

pub const SECTOR_SIZE_K: u64 = 1 << 10;
pub const SECTOR_SIZE_M: u64 = 1 << 20;
pub const SECTOR_SIZE_G: u64 = 1 << 30;
pub const SECTOR_SIZE_T: u64 = 1 << 40;

// --- Sector Creation ---

/// Free space demanded beyond `data_size + meta_size` before a create is
/// allowed to start.
pub const CREATE_SLACK_BYTES: u64 = 1024 * 1024;

/// Report fill progress every this many leaves.
pub const FILL_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Report block-root progress every this many blocks.
pub const BLOCK_ROOT_PROGRESS_INTERVAL: u64 = 1_000;

// --- Integrity Checks ---

/// Number of uniformly random challenges drawn by the fast integrity check,
/// in addition to the deterministic pair `{0, N-1}`.
pub const FAST_CHECK_RANDOM_CHALLENGES: usize = 8;

// --- Packed Proof Wire Format ---

/// Inflation bound factor: decompressed output may not exceed
/// `UNPACK_LIMIT_FACTOR * packed_len` bytes.
pub const UNPACK_LIMIT_FACTOR: usize = 10;

/// Hard ceiling on decompressed output regardless of input size.
pub const UNPACK_LIMIT_CEILING: usize = 1_000_000;

// --- On-Disk Layout ---

/// Extension of the data region file (`<sector_id>.dat`).
pub const DATA_FILE_EXT: &str = "dat";

/// Extension of the meta region file (`<sector_id>.mta`).
pub const META_FILE_EXT: &str = "mta";

// --- Test-related Constants ---

/// A fixed random seed used in tests to ensure deterministic behavior.
pub const TEST_RANDOM_SEED: u64 = 42;
