//! The compression primitive for sector items.
//!
//! Every hash in the sector, leaf derivation and Merkle combination alike,
//! is a single SHA-256 block compression over the fixed initialization
//! vector. The 16 input words are fed to the compression function directly as
//! message words, so both sides of the protocol agree on the result
//! bit-for-bit without any serialization in between.

use byteorder::{BigEndian, ByteOrder};
use generic_array::GenericArray;
use sha2::compress256;
use typenum::U64;

/// One 64-byte message block as the compression function consumes it.
type Block = GenericArray<u8, U64>;

/// SHA-256 initial hash values (FIPS 180-4 §5.3.3).
const SHA256_IV: [u32; 8] = [
    0x6a09_e667,
    0xbb67_ae85,
    0x3c6e_f372,
    0xa54f_f53a,
    0x510e_527f,
    0x9b05_688c,
    0x1f83_d9ab,
    0x5be0_cd19,
];

/// Compress 16 words into 8 with one SHA-256 block compression.
///
/// The words become the message schedule input directly: SHA-256 reads its
/// 64-byte block as big-endian words, so each input word is written
/// big-endian into the block. The output is the resulting state.
pub fn compress_block(words: &[u32; 16]) -> [u32; 8] {
    let mut block = [0u8; 64];
    for (chunk, word) in block.chunks_exact_mut(4).zip(words.iter()) {
        BigEndian::write_u32(chunk, *word);
    }

    let mut state = SHA256_IV;
    compress256(&mut state, std::slice::from_ref(Block::from_slice(&block)));
    state
}
