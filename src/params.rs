//! Sector geometry derived from `data_size`.
//!
//! Every other quantity of a sector (item count, block size, meta layout,
//! Merkle path length) is a pure function of `data_size`, which must be a
//! power of two. Centralizing the derivation keeps prover and verifier in
//! exact agreement.

use crate::config::{ITEM_SIZE_BYTES, MIN_DATA_SIZE};
use crate::error::{Result, SectorError};

/// Geometry of a sector with a power-of-two `data_size`.
///
/// Invariants established at construction:
/// - `data_count` is a power of two ≥ 2^6
/// - `block_size` is a power of two dividing `data_count`
/// - `meta_count = data_count / block_size + 1 ≥ 2`, so the top tree over
///   the `meta_count - 1` block roots is perfect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorParams {
    /// Size of the data region in bytes.
    pub data_size: u64,
    /// Number of items in the data region (`N`).
    pub data_count: u64,
    /// Items per Merkle block (`B`), roughly √N rounded down to a power of two.
    pub block_size: u64,
    /// Size of the meta region in bytes.
    pub meta_size: u64,
    /// Number of items in the meta region (`M`): block roots plus the top root.
    pub meta_count: u64,
}

impl SectorParams {
    /// Derive the geometry, validating `data_size`.
    pub fn new(data_size: u64) -> Result<Self> {
        if data_size == 0 || !data_size.is_power_of_two() {
            return Err(SectorError::InvalidDataSize { size: data_size });
        }

        let data_count = data_size / ITEM_SIZE_BYTES as u64;
        let block_size = 1u64 << (data_count.trailing_zeros() / 2);
        let meta_count = data_count / block_size + 1;
        let meta_size = meta_count * ITEM_SIZE_BYTES as u64;

        if data_size < MIN_DATA_SIZE || meta_count < 2 {
            return Err(SectorError::DataSizeTooSmall { size: data_size });
        }

        Ok(SectorParams {
            data_size,
            data_count,
            block_size,
            meta_size,
            meta_count,
        })
    }

    /// Number of Merkle blocks (`meta_count - 1`).
    pub fn block_count(&self) -> u64 {
        self.meta_count - 1
    }

    /// Authentication path length from a data leaf to the top root:
    /// `log2(block_size) + log2(block_count) = log2(data_count)`.
    pub fn path_len(&self) -> usize {
        self.data_count.trailing_zeros() as usize
    }

    /// Serialized size of one proof on the wire: five opened nodes plus the
    /// authentication path.
    pub fn proof_size_bytes(&self) -> usize {
        (self.path_len() + 5) * ITEM_SIZE_BYTES
    }
}
