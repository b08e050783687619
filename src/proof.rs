//! Sector proofs and their byte layouts.
//!
//! A [`SectorProof`] opens one challenged leaf: the leaf itself, its two
//! ancestors, the ancestors of the pseudo-random ancestor, and the Merkle
//! authentication path to the top root. The wire layout is the raw
//! little-endian item bytes in that order; packing (gzip) and unpacking live
//! with the prover and verifier.
//!
//! This module also writes the persistent proof-file layout used by the
//! driver: identity, root, then `(challenge, proof)` records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::config::ITEM_SIZE_BYTES;
use crate::error::Result;
use crate::item::SectorItem;

/// Proof for a single challenged leaf `c`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectorProof {
    /// The challenged leaf `D[c]`.
    pub node_c: SectorItem,
    /// Structural parent `D[x(c)] = D[c-1]`.
    pub node_cx: SectorItem,
    /// Pseudo-random ancestor `D[y(c)]`.
    pub node_cy: SectorItem,
    /// Structural parent of the ancestor, `D[x(y(c))]`.
    pub node_cyx: SectorItem,
    /// Pseudo-random ancestor of the ancestor, `D[y(y(c))]`.
    pub node_cyy: SectorItem,
    /// Authentication path from leaf `c` to the top root, bottom-up.
    pub mkl_path: Vec<SectorItem>,
}

impl SectorProof {
    /// Serialized size: five opened nodes plus the path.
    pub fn size_bytes(&self) -> usize {
        (self.mkl_path.len() + 5) * ITEM_SIZE_BYTES
    }

    /// Emit the raw wire bytes of this proof, nodes then path.
    pub fn write_raw(&self, out: &mut impl Write) -> std::io::Result<()> {
        for node in [
            &self.node_c,
            &self.node_cx,
            &self.node_cy,
            &self.node_cyx,
            &self.node_cyy,
        ] {
            out.write_all(&node.to_bytes())?;
        }
        for item in &self.mkl_path {
            out.write_all(&item.to_bytes())?;
        }
        Ok(())
    }

    /// Parse one proof with a path of `path_len` items from `bytes`.
    /// The slice must hold exactly `(path_len + 5) * 32` bytes.
    pub fn read_raw(bytes: &[u8], path_len: usize) -> SectorProof {
        assert_eq!(bytes.len(), (path_len + 5) * ITEM_SIZE_BYTES);

        let item_at = |i: usize| {
            let start = i * ITEM_SIZE_BYTES;
            let fixed: &[u8; ITEM_SIZE_BYTES] = bytes[start..start + ITEM_SIZE_BYTES]
                .try_into()
                .expect("item slice has fixed width");
            SectorItem::from_bytes(fixed)
        };

        SectorProof {
            node_c: item_at(0),
            node_cx: item_at(1),
            node_cy: item_at(2),
            node_cyx: item_at(3),
            node_cyy: item_at(4),
            mkl_path: (0..path_len).map(|i| item_at(5 + i)).collect(),
        }
    }
}

impl std::fmt::Display for SectorProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "node_c:   {}", self.node_c)?;
        writeln!(f, "node_cx:  {}", self.node_cx)?;
        writeln!(f, "node_cy:  {}", self.node_cy)?;
        writeln!(f, "node_cyx: {}", self.node_cyx)?;
        writeln!(f, "node_cyy: {}", self.node_cyy)?;
        writeln!(f, "mkl_path:")?;
        for item in &self.mkl_path {
            writeln!(f, "  {item}")?;
        }
        Ok(())
    }
}

/// Write the persistent proof file:
/// `[32 B pad(user_id ∥ sector_id)][32 B root]` then per challenge
/// `[8 B LE challenge][proof bytes]`.
pub fn save_proof_file(
    path: &Path,
    user_id: &str,
    sector_id: &str,
    root: &SectorItem,
    challenges: &[u64],
    proofs: &[SectorProof],
) -> Result<()> {
    assert_eq!(challenges.len(), proofs.len());

    let mut identity = [0u8; ITEM_SIZE_BYTES];
    let id = [user_id.as_bytes(), sector_id.as_bytes()].concat();
    let take = id.len().min(ITEM_SIZE_BYTES);
    identity[..take].copy_from_slice(&id[..take]);

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&identity)?;
    out.write_all(&root.to_bytes())?;
    for (challenge, proof) in challenges.iter().zip(proofs.iter()) {
        out.write_u64::<LittleEndian>(*challenge)?;
        proof.write_raw(&mut out)?;
    }
    out.flush()?;
    Ok(())
}
