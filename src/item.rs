//! The 32-byte sector item and its derivation primitives.
//!
//! A [`SectorItem`] is the unit of storage, hashing, and Merkle combination:
//! eight 32-bit words, stored little-endian on disk and on the wire. This
//! module also defines the two ancestor-index functions that shape the
//! sector's dependency graph (`parent_x`, `parent_y`) and the chained
//! derivation rule ([`derive_item`], [`initial_item`]).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::config::ITEM_SIZE_BYTES;
use crate::sha256::compress_block;

/// A fixed 32-byte sector value, interpreted as eight 32-bit words.
///
/// Items are plain values: copy freely, compare bytewise. File and wire
/// layout is the eight words in little-endian byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectorItem {
    words: [u32; 8],
}

impl SectorItem {
    /// The all-zero item, used as the conventional parent of position 0.
    pub const ZERO: SectorItem = SectorItem { words: [0; 8] };

    /// Item encoding a 64-bit position: `w[0]` is the low half, `w[1]` the
    /// high half, the rest zero.
    pub fn from_index(n: u64) -> Self {
        let mut words = [0u32; 8];
        words[0] = n as u32;
        words[1] = (n >> 32) as u32;
        SectorItem { words }
    }

    /// Identity-derived item: `user_id ∥ sector_id` as UTF-8, zero-padded or
    /// truncated to 32 bytes, read as eight big-endian words.
    ///
    /// This is the only place big-endian byte decoding enters the data model;
    /// it must stay bit-exact for prover and verifier to agree.
    pub fn from_id(user_id: &str, sector_id: &str) -> Self {
        let mut bytes = [0u8; ITEM_SIZE_BYTES];
        let id = [user_id.as_bytes(), sector_id.as_bytes()].concat();
        let take = id.len().min(ITEM_SIZE_BYTES);
        bytes[..take].copy_from_slice(&id[..take]);

        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = BigEndian::read_u32(chunk);
        }
        SectorItem { words }
    }

    /// Word-wise XOR.
    pub fn xor(a: &SectorItem, b: &SectorItem) -> SectorItem {
        let mut words = [0u32; 8];
        for i in 0..8 {
            words[i] = a.words[i] ^ b.words[i];
        }
        SectorItem { words }
    }

    /// Pair compression: one SHA-256 block compression over `a.w ∥ b.w`.
    pub fn compress(a: &SectorItem, b: &SectorItem) -> SectorItem {
        let mut input = [0u32; 16];
        input[..8].copy_from_slice(&a.words);
        input[8..].copy_from_slice(&b.words);
        SectorItem {
            words: compress_block(&input),
        }
    }

    /// Structural parent index: the immediate predecessor. Position 0 has no
    /// predecessor and maps to itself by convention.
    pub fn parent_x(n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        n - 1
    }

    /// Pseudo-random ancestor index, derived from this item (the source,
    /// `D[n-1]`): XOR-fold the words as four 64-bit values and reduce mod `n`.
    ///
    /// The pairing is `w[2i]` as the low half and `w[2i+1]` as the high
    /// half; prover and verifier would disagree on ancestor indices under
    /// any other layout.
    pub fn parent_y(&self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let mut folded = 0u64;
        for i in 0..4 {
            let half = self.words[i * 2] as u64 | ((self.words[i * 2 + 1] as u64) << 32);
            folded ^= half;
        }
        folded % n
    }

    /// Serialize as the eight words in little-endian byte order.
    pub fn to_bytes(&self) -> [u8; ITEM_SIZE_BYTES] {
        let mut bytes = [0u8; ITEM_SIZE_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.words.iter()) {
            LittleEndian::write_u32(chunk, *word);
        }
        bytes
    }

    /// Inverse of [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8; ITEM_SIZE_BYTES]) -> Self {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = LittleEndian::read_u32(chunk);
        }
        SectorItem { words }
    }

    /// Hex rendering of the on-disk byte layout, for logs and diagnostics.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl std::fmt::Display for SectorItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The chained derivation rule: `D[n] = h(prefix ⊕ dx, Item(n) ⊕ dy)`.
pub fn derive_item(prefix: &SectorItem, n: u64, dx: &SectorItem, dy: &SectorItem) -> SectorItem {
    let left = SectorItem::xor(prefix, dx);
    let right = SectorItem::xor(&SectorItem::from_index(n), dy);
    SectorItem::compress(&left, &right)
}

/// The canonical item for position 0: both parents are the zero item.
pub fn initial_item(prefix: &SectorItem) -> SectorItem {
    derive_item(prefix, 0, &SectorItem::ZERO, &SectorItem::ZERO)
}
