//! Typed item views over raw byte regions.
//!
//! The prover's backing provider (a memory-mapped file) hands out plain byte
//! slices; these wrappers expose them as sequences of fixed-width
//! [`SectorItem`]s addressed by index. Views borrow; the maps stay owned by
//! whoever opened them.

use crate::config::ITEM_SIZE_BYTES;
use crate::item::SectorItem;

/// Read-only view of a byte region as a sequence of items.
#[derive(Debug, Clone, Copy)]
pub struct ItemRegion<'a> {
    bytes: &'a [u8],
}

impl<'a> ItemRegion<'a> {
    /// Wrap a byte region. The length must be a whole number of items.
    pub fn new(bytes: &'a [u8]) -> Self {
        assert_eq!(
            bytes.len() % ITEM_SIZE_BYTES,
            0,
            "region length {} is not a whole number of items",
            bytes.len()
        );
        ItemRegion { bytes }
    }

    /// Number of items in the view.
    pub fn len(&self) -> u64 {
        (self.bytes.len() / ITEM_SIZE_BYTES) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy out the item at `index`.
    pub fn get(&self, index: u64) -> SectorItem {
        let start = index as usize * ITEM_SIZE_BYTES;
        let bytes: &[u8; ITEM_SIZE_BYTES] = self.bytes[start..start + ITEM_SIZE_BYTES]
            .try_into()
            .expect("item slice has fixed width");
        SectorItem::from_bytes(bytes)
    }

    /// Sub-view of `count` items starting at `start`.
    pub fn range(&self, start: u64, count: u64) -> ItemRegion<'a> {
        let begin = start as usize * ITEM_SIZE_BYTES;
        let end = begin + count as usize * ITEM_SIZE_BYTES;
        ItemRegion {
            bytes: &self.bytes[begin..end],
        }
    }
}

/// Writable view of a byte region as a sequence of items.
#[derive(Debug)]
pub struct ItemRegionMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> ItemRegionMut<'a> {
    /// Wrap a writable byte region. The length must be a whole number of items.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        assert_eq!(
            bytes.len() % ITEM_SIZE_BYTES,
            0,
            "region length {} is not a whole number of items",
            bytes.len()
        );
        ItemRegionMut { bytes }
    }

    pub fn len(&self) -> u64 {
        (self.bytes.len() / ITEM_SIZE_BYTES) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: u64) -> SectorItem {
        let start = index as usize * ITEM_SIZE_BYTES;
        let bytes: &[u8; ITEM_SIZE_BYTES] = self.bytes[start..start + ITEM_SIZE_BYTES]
            .try_into()
            .expect("item slice has fixed width");
        SectorItem::from_bytes(bytes)
    }

    pub fn set(&mut self, index: u64, item: &SectorItem) {
        let start = index as usize * ITEM_SIZE_BYTES;
        self.bytes[start..start + ITEM_SIZE_BYTES].copy_from_slice(&item.to_bytes());
    }

    /// Reborrow as a read-only view.
    pub fn as_region(&self) -> ItemRegion<'_> {
        ItemRegion { bytes: self.bytes }
    }
}
