//! The sector verifier: checks proofs against a root commitment.
//!
//! A [`SectorVerifier`] holds only its construction arguments (identity,
//! geometry, and the claimed top root) and touches no disk. Each proof is
//! checked by recomputing the challenged leaf and its pseudo-random ancestor
//! from the opened nodes, then folding the authentication path against the
//! root. All integrity failures are reported as `false`, never as panics.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::config::{UNPACK_LIMIT_CEILING, UNPACK_LIMIT_FACTOR};
use crate::error::Result;
use crate::item::{derive_item, initial_item, SectorItem};
use crate::merkle::verify_path;
use crate::params::SectorParams;
use crate::proof::SectorProof;

/// Verifier side of the protocol. Stateless apart from its construction
/// arguments.
#[derive(Debug, Clone)]
pub struct SectorVerifier {
    params: SectorParams,
    prefix: SectorItem,
    d0: SectorItem,
    mkl_root: SectorItem,
}

impl SectorVerifier {
    /// Validate the geometry and precompute the identity prefix and `d0`.
    pub fn new(
        user_id: &str,
        sector_id: &str,
        data_size: u64,
        mkl_root: SectorItem,
    ) -> Result<Self> {
        let params = SectorParams::new(data_size)?;
        let prefix = SectorItem::from_id(user_id, sector_id);
        let d0 = initial_item(&prefix);

        Ok(SectorVerifier {
            params,
            prefix,
            d0,
            mkl_root,
        })
    }

    /// Verify one proof per challenge, short-circuiting on the first
    /// failure. Panics on an empty challenge list (programmer error); a
    /// length mismatch between challenges and proofs fails verification.
    pub fn verify_proofs(&self, challenges: &[u64], proofs: &[SectorProof]) -> bool {
        assert!(!challenges.is_empty(), "empty challenges");

        if proofs.len() != challenges.len() {
            debug!(
                "challenge/proof length mismatch: {} vs {}",
                challenges.len(),
                proofs.len()
            );
            return false;
        }

        challenges
            .iter()
            .zip(proofs)
            .all(|(&challenge, proof)| self.verify_proof(challenge, proof))
    }

    /// Verify a single proof for `challenge` (reduced mod the leaf count).
    pub fn verify_proof(&self, challenge: u64, proof: &SectorProof) -> bool {
        let c = challenge % self.params.data_count;

        if proof.mkl_path.len() != self.params.path_len() {
            return false;
        }

        // The challenged leaf must recompute from its opened ancestors.
        let node_c = if c > 0 {
            derive_item(&self.prefix, c, &proof.node_cx, &proof.node_cy)
        } else {
            self.d0
        };
        if node_c != proof.node_c {
            return false;
        }

        // The pseudo-random ancestor must recompute likewise. Its index is
        // derived from the opened predecessor, which the path check below
        // binds to the sector.
        let cy = proof.node_cx.parent_y(c);
        let node_cy = if cy > 0 {
            derive_item(&self.prefix, cy, &proof.node_cyx, &proof.node_cyy)
        } else {
            self.d0
        };
        if node_cy != proof.node_cy {
            return false;
        }

        if !verify_path(&proof.node_c, c, &self.mkl_root, &proof.mkl_path) {
            return false;
        }

        // For odd positions the predecessor is the Merkle sibling at level
        // 0, binding node_cx directly.
        if c % 2 == 1 && proof.node_cx != proof.mkl_path[0] {
            return false;
        }

        true
    }

    /// Verify a packed proof blob against `challenges`.
    pub fn verify_packed_proofs(&self, challenges: &[u64], packed: &[u8]) -> bool {
        assert!(!challenges.is_empty(), "empty challenges");

        let proofs = self.unpack_proofs(packed);
        if proofs.len() != challenges.len() {
            return false;
        }
        self.verify_proofs(challenges, &proofs)
    }

    /// Decode a packed proof blob, returning an empty vector on any
    /// malformation: gzip errors, output beyond the inflation limit, or a
    /// raw length that is not a positive multiple of the proof size.
    ///
    /// The inflation limit `min(10 · packed_len, 1_000_000)` bounds
    /// decompression bombs.
    pub fn unpack_proofs(&self, packed: &[u8]) -> Vec<SectorProof> {
        let limit = (packed.len() * UNPACK_LIMIT_FACTOR).min(UNPACK_LIMIT_CEILING);

        let mut raw = Vec::new();
        let mut decoder = GzDecoder::new(packed);
        let mut buf = [0u8; 4096];
        loop {
            match decoder.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if raw.len() + n >= limit {
                        debug!("packed proofs exceed inflation limit {limit}");
                        return Vec::new();
                    }
                    raw.extend_from_slice(&buf[..n]);
                }
                Err(e) => {
                    debug!("packed proof decode failed: {e}");
                    return Vec::new();
                }
            }
        }

        let path_len = self.params.path_len();
        let proof_size = self.params.proof_size_bytes();
        if raw.is_empty() || raw.len() % proof_size != 0 {
            debug!("raw proof length {} is not a multiple of {proof_size}", raw.len());
            return Vec::new();
        }

        raw.chunks_exact(proof_size)
            .map(|chunk| SectorProof::read_raw(chunk, path_len))
            .collect()
    }
}
