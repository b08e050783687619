//! The sector prover: owns the on-disk regions and answers challenges.
//!
//! A [`SectorProver`] is constructed against a directory and a sector
//! identity, then either [`create`](SectorProver::create)s the two region
//! files (the long pass) or [`open`](SectorProver::open)s existing ones with
//! an optional integrity check. Once opened, the regions are read-only for
//! the lifetime of the instance and proofs can be generated.
//!
//! Environmental failures (missing files, disk full, size mismatch) are
//! reported as `false` from `create`/`open` after being logged; misuse of an
//! unopened prover or empty challenge lists is a programmer error and
//! panics.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;
use memmap::{Mmap, MmapMut};
use rand::{rngs::OsRng, Rng};
use tracing::{debug, info, info_span, warn};

use crate::builder::{build_data, ProgressFn};
use crate::config::{
    BLOCK_ROOT_PROGRESS_INTERVAL, CREATE_SLACK_BYTES, DATA_FILE_EXT,
    FAST_CHECK_RANDOM_CHALLENGES, META_FILE_EXT,
};
use crate::error::{Result, SectorError};
use crate::item::{initial_item, SectorItem};
use crate::merkle::{mkl_paths, mkl_root};
use crate::params::SectorParams;
use crate::proof::SectorProof;
use crate::region::{ItemRegion, ItemRegionMut};
use crate::verifier::SectorVerifier;

/// Integrity pass to run when opening an existing sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityCheck {
    /// Open without checking.
    #[default]
    None,
    /// Recompute every block root and the top root.
    Full,
    /// Self-verify proofs for `{0, N-1}` plus a handful of random leaves.
    Fast,
}

/// Prover side of the protocol: builds and serves one sector.
pub struct SectorProver {
    user_id: String,
    sector_id: String,
    params: SectorParams,
    path: PathBuf,
    data_path: PathBuf,
    meta_path: PathBuf,
    prefix: SectorItem,
    d0: SectorItem,
    data_view: Option<Mmap>,
    meta_view: Option<Mmap>,
}

impl SectorProver {
    /// Validate identity, geometry, and the backing directory.
    pub fn new(
        user_id: impl Into<String>,
        sector_id: impl Into<String>,
        data_size: u64,
        path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let sector_id = sector_id.into();
        let path = path.into();
        let params = SectorParams::new(data_size)?;

        if path.as_os_str().is_empty() {
            return Err(SectorError::InvalidPath {
                path,
                reason: "empty pathname".into(),
            });
        }
        if !path.exists() {
            return Err(SectorError::InvalidPath {
                path,
                reason: "path does not exist".into(),
            });
        }
        if !path.is_dir() {
            return Err(SectorError::InvalidPath {
                path,
                reason: "path is not a directory".into(),
            });
        }

        let data_path = path.join(format!("{sector_id}.{DATA_FILE_EXT}"));
        let meta_path = path.join(format!("{sector_id}.{META_FILE_EXT}"));
        let prefix = SectorItem::from_id(&user_id, &sector_id);
        let d0 = initial_item(&prefix);

        Ok(SectorProver {
            user_id,
            sector_id,
            params,
            path,
            data_path,
            meta_path,
            prefix,
            d0,
            data_view: None,
            meta_view: None,
        })
    }

    /// Build the sector from scratch: fill the data region, commit it into
    /// the meta region, and leave both open read-only.
    ///
    /// Returns `false` (with both files removed) on any environmental
    /// failure, and `false` without side effects if the prover is already
    /// opened.
    pub fn create(&mut self, progress: &ProgressFn) -> bool {
        if self.is_opened() {
            return false;
        }

        let _span = info_span!("create_sector", sector_id = %self.sector_id).entered();

        match self.try_create(progress) {
            Ok(()) => true,
            Err(e) => {
                warn!("sector create failed: {e}");
                let _ = fs::remove_file(&self.data_path);
                let _ = fs::remove_file(&self.meta_path);
                self.data_view = None;
                self.meta_view = None;
                false
            }
        }
    }

    /// Open an existing sector read-only, optionally running an integrity
    /// pass. Returns `false` if the files are missing, sized wrong, already
    /// opened, or the requested check fails.
    pub fn open(&mut self, flag: IntegrityCheck) -> bool {
        if self.is_opened() {
            return false;
        }

        if let Err(e) = self.open_data().and_then(|_| self.open_meta()) {
            debug!("sector open failed: {e}");
            self.data_view = None;
            self.meta_view = None;
            return false;
        }

        match flag {
            IntegrityCheck::None => true,
            IntegrityCheck::Full => self.full_integrity_check(),
            IntegrityCheck::Fast => self.fast_integrity_check(),
        }
    }

    /// Whether both regions are currently opened.
    pub fn is_opened(&self) -> bool {
        self.data_view.is_some() && self.meta_view.is_some()
    }

    /// The top Merkle root. Panics if the sector is not opened.
    pub fn mkl_root(&self) -> SectorItem {
        let meta = self.meta_region();
        meta.get(self.params.meta_count - 1)
    }

    /// The identity prefix mixed into every compression.
    pub fn prefix(&self) -> &SectorItem {
        &self.prefix
    }

    /// The canonical item for position 0.
    pub fn d0(&self) -> &SectorItem {
        &self.d0
    }

    /// Sector geometry.
    pub fn params(&self) -> &SectorParams {
        &self.params
    }

    /// Answer `challenges` with one proof each, in input order.
    ///
    /// Panics on an empty challenge list or an unopened prover; both are
    /// programmer errors.
    pub fn generate_proofs(&self, challenges: &[u64]) -> Vec<SectorProof> {
        assert!(!challenges.is_empty(), "empty challenges");
        let data = self.data_region();

        let _span = info_span!("generate_proofs", count = challenges.len()).entered();

        let n = self.params.data_count;
        let mut proofs = Vec::with_capacity(challenges.len());
        let mut leaves = Vec::with_capacity(challenges.len());

        for &challenge in challenges {
            let c = challenge % n;

            let mut proof = SectorProof {
                node_c: data.get(c),
                ..Default::default()
            };

            let source = data.get(if c > 0 { c - 1 } else { 0 });
            let cx = SectorItem::parent_x(c);
            let cy = source.parent_y(c);
            proof.node_cx = data.get(cx);
            proof.node_cy = data.get(cy);

            let source2 = data.get(if cy > 0 { cy - 1 } else { 0 });
            let yx = SectorItem::parent_x(cy);
            let yy = source2.parent_y(cy);
            proof.node_cyx = data.get(yx);
            proof.node_cyy = data.get(yy);

            proofs.push(proof);
            leaves.push(c);
        }

        let paths = self.merkle_paths(&leaves);
        let path_len = self.params.path_len();
        for (proof, path) in proofs.iter_mut().zip(paths) {
            assert_eq!(path.len(), path_len, "authentication path length");
            proof.mkl_path = path;
        }

        proofs
    }

    /// Serialize `proofs` into the packed wire format: raw item bytes,
    /// gzip-compressed, no framing.
    pub fn pack_proofs(&self, proofs: &[SectorProof]) -> Vec<u8> {
        let raw_size: usize = proofs.iter().map(SectorProof::size_bytes).sum();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for proof in proofs {
            proof
                .write_raw(&mut encoder)
                .expect("gzip into memory cannot fail");
        }
        let packed = encoder.finish().expect("gzip into memory cannot fail");

        debug!("pack_proofs: {raw_size} -> {} bytes", packed.len());
        packed
    }

    /// Generate and pack in one step.
    pub fn generate_packed_proofs(&self, challenges: &[u64]) -> Vec<u8> {
        assert!(!challenges.is_empty(), "empty challenges");
        let proofs = self.generate_proofs(challenges);
        self.pack_proofs(&proofs)
    }

    // --- Creation internals ---

    fn try_create(&mut self, progress: &ProgressFn) -> Result<()> {
        let available = fs2::available_space(&self.path)?;
        let needed = self.params.data_size + self.params.meta_size + CREATE_SLACK_BYTES;
        if available < needed {
            return Err(SectorError::InsufficientSpace { needed, available });
        }

        self.init_data(progress)?;
        self.open_data()?;
        self.init_meta(progress)?;
        self.open_meta()?;
        Ok(())
    }

    /// Fill the data region through a fresh writable map, then flush.
    fn init_data(&self, progress: &ProgressFn) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.data_path)?;
        file.set_len(self.params.data_size)?;

        let mut map = unsafe { MmapMut::map_mut(&file)? };
        let mut region = ItemRegionMut::new(&mut map);
        build_data(&mut region, &self.prefix, progress);
        map.flush()?;
        Ok(())
    }

    /// Compute all block roots and the top root into the meta region.
    fn init_meta(&self, progress: &ProgressFn) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.meta_path)?;
        file.set_len(self.params.meta_size)?;

        let mut map = unsafe { MmapMut::map_mut(&file)? };
        let mut meta = ItemRegionMut::new(&mut map);
        let data = self.data_region();

        let block_size = self.params.block_size;
        let block_count = self.params.block_count();
        for i in 0..block_count {
            let block = data.range(i * block_size, block_size);
            meta.set(i, &mkl_root(&block));

            if i % BLOCK_ROOT_PROGRESS_INTERVAL == 0 {
                progress(
                    (i * 100 / block_count) as u32,
                    &format!("calculate block root: {i}"),
                );
            }
        }

        let top = mkl_root(&meta.as_region().range(0, block_count));
        meta.set(block_count, &top);
        map.flush()?;

        info!("root: {top}");
        Ok(())
    }

    fn open_data(&mut self) -> Result<()> {
        let file = File::open(&self.data_path)?;
        let actual = file.metadata()?.len();
        if actual != self.params.data_size {
            return Err(SectorError::SizeMismatch {
                path: self.data_path.clone(),
                expected: self.params.data_size,
                actual,
            });
        }
        self.data_view = Some(unsafe { Mmap::map(&file)? });
        Ok(())
    }

    fn open_meta(&mut self) -> Result<()> {
        let file = File::open(&self.meta_path)?;
        let actual = file.metadata()?.len();
        if actual != self.params.meta_size {
            return Err(SectorError::SizeMismatch {
                path: self.meta_path.clone(),
                expected: self.params.meta_size,
                actual,
            });
        }
        self.meta_view = Some(unsafe { Mmap::map(&file)? });
        Ok(())
    }

    // --- Integrity checks ---

    /// Recompute every block root and the top root against the meta region.
    fn full_integrity_check(&self) -> bool {
        let _span = info_span!("full_integrity_check").entered();
        let data = self.data_region();
        let meta = self.meta_region();

        let block_size = self.params.block_size;
        let block_count = self.params.block_count();
        for i in 0..block_count {
            let block = data.range(i * block_size, block_size);
            if mkl_root(&block) != meta.get(i) {
                warn!("block root {i} does not match the meta region");
                return false;
            }
        }

        let top = mkl_root(&meta.range(0, block_count));
        if top != self.mkl_root() {
            warn!("top root does not match the meta region");
            return false;
        }

        true
    }

    /// Self-generate proofs for the deterministic pair `{0, N-1}` plus
    /// random challenges and run the verifier against them.
    fn fast_integrity_check(&self) -> bool {
        let _span = info_span!("fast_integrity_check").entered();

        let mut challenges = vec![0, self.params.data_count - 1];
        for _ in 0..FAST_CHECK_RANDOM_CHALLENGES {
            challenges.push(OsRng.gen::<u64>());
        }

        let proofs = self.generate_proofs(&challenges);
        if proofs.len() != challenges.len() {
            return false;
        }

        let verifier = match SectorVerifier::new(
            &self.user_id,
            &self.sector_id,
            self.params.data_size,
            self.mkl_root(),
        ) {
            Ok(verifier) => verifier,
            Err(e) => {
                warn!("verifier construction failed: {e}");
                return false;
            }
        };
        verifier.verify_proofs(&challenges, &proofs)
    }

    // --- Region access ---

    fn data_region(&self) -> ItemRegion<'_> {
        let map = self.data_view.as_ref().expect("sector not opened");
        ItemRegion::new(&map[..])
    }

    fn meta_region(&self) -> ItemRegion<'_> {
        let map = self.meta_view.as_ref().expect("sector not opened");
        ItemRegion::new(&map[..])
    }

    /// Two-level authentication: per-block lower segments batched with one
    /// pass per touched block, then a single upper pass over the block
    /// roots, each checked against its stored root.
    fn merkle_paths(&self, leaves: &[u64]) -> Vec<Vec<SectorItem>> {
        let data = self.data_region();
        let meta = self.meta_region();
        let block_size = self.params.block_size;

        for &leaf in leaves {
            assert!(leaf < self.params.data_count, "leaf out of range");
        }

        let mut paths: Vec<Vec<SectorItem>> = vec![Vec::new(); leaves.len()];

        // Leaf to block root. Leaves sharing a block share one pass.
        let mut by_block: HashMap<u64, Vec<usize>> = HashMap::new();
        for (request, &leaf) in leaves.iter().enumerate() {
            by_block.entry(leaf / block_size).or_default().push(request);
        }

        for (block, requests) in &by_block {
            let region = data.range(block * block_size, block_size);
            let positions: Vec<u64> = requests
                .iter()
                .map(|&request| leaves[request] % block_size)
                .collect();
            let block_root = meta.get(*block);

            let lower = mkl_paths(&region, &positions, &block_root);
            for (&request, path) in requests.iter().zip(lower) {
                paths[request] = path;
            }
        }

        // Block root to top root, one pass for all requests.
        let block_count = self.params.block_count();
        let top_positions: Vec<u64> = leaves.iter().map(|&leaf| leaf / block_size).collect();
        let top_root = meta.get(block_count);

        let upper = mkl_paths(&meta.range(0, block_count), &top_positions, &top_root);
        for (path, segment) in paths.iter_mut().zip(upper) {
            path.extend(segment);
        }

        paths
    }
}

impl std::fmt::Debug for SectorProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorProver")
            .field("user_id", &self.user_id)
            .field("sector_id", &self.sector_id)
            .field("params", &self.params)
            .field("opened", &self.is_opened())
            .finish()
    }
}
