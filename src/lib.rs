//! Proof-of-Space sector engine
//!
//! This library implements a storage-based challenge/response scheme: a
//! prover fills a large pseudo-random *sector* derived from its identity,
//! commits to it with a two-level Merkle tree, and later answers random
//! challenges with short witnesses. A verifier holding only the 32-byte root
//! commitment checks each witness in time logarithmic in the sector size.
//!
//! ## Main Components
//!
//! - [`item`]: the 32-byte item value type, its parent-index functions, and
//!   the chained derivation rule
//! - [`builder`]: the sequential sector fill
//! - [`merkle`]: out-of-core Merkle roots and batched authentication paths
//! - [`prover`]: sector lifecycle (create/open/integrity) and proof
//!   generation
//! - [`verifier`]: stateless proof verification and wire-format decoding
//! - [`config`]: centralized constants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pospace_crypto::{IntegrityCheck, SectorProver, SectorVerifier};
//!
//! // 1. Build a 1 MiB sector bound to (user, sector) identity.
//! let mut prover = SectorProver::new("abcd", "1234", 1 << 20, "/tmp/sectors")?;
//! assert!(prover.create(&|percent, desc| println!("{percent}%, {desc}")));
//!
//! // 2. Answer challenges with packed proofs.
//! let challenges = vec![7, 11];
//! let packed = prover.generate_packed_proofs(&challenges);
//!
//! // 3. Verify against nothing but the root commitment.
//! let verifier = SectorVerifier::new("abcd", "1234", 1 << 20, prover.mkl_root())?;
//! assert!(verifier.verify_packed_proofs(&challenges, &packed));
//! # Ok::<(), pospace_crypto::SectorError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod item;
pub mod merkle;
pub mod params;
pub mod proof;
pub mod prover;
pub mod region;
pub mod sha256;
pub mod verifier;

// Re-export commonly used types and functions for convenience
pub use builder::{build_data, ProgressFn};
pub use error::{Result, SectorError};
pub use item::{derive_item, initial_item, SectorItem};
pub use params::SectorParams;
pub use proof::{save_proof_file, SectorProof};
pub use prover::{IntegrityCheck, SectorProver};
pub use verifier::SectorVerifier;
