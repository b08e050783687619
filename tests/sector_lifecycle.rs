//! End-to-end sector lifecycle tests.
//!
//! These exercise the full prover/verifier flow on real (small) sectors:
//! create, reopen with integrity checks, prove, pack, and verify.

mod common;

use common::{build_sector, SECTOR_ID, USER_ID};
use pospace_crypto::{IntegrityCheck, SectorError, SectorProver, SectorVerifier};

#[test]
fn test_challenge_zero_opens_d0() {
    let sector = build_sector(1 << 20);
    let proofs = sector.prover.generate_proofs(&[0]);

    assert_eq!(&proofs[0].node_c, sector.prover.d0());
    assert_eq!(&proofs[0].node_cy, sector.prover.d0());
    assert_eq!(proofs[0].mkl_path.len(), 15);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 20, sector.prover.mkl_root())
        .expect("verifier construction");
    assert!(verifier.verify_proofs(&[0], &proofs));
}

#[test]
fn test_last_leaf_authenticates() {
    let sector = build_sector(1 << 20);
    let last = sector.prover.params().data_count - 1;
    let proofs = sector.prover.generate_proofs(&[last]);
    assert_eq!(proofs[0].mkl_path.len(), 15);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 20, sector.prover.mkl_root())
        .expect("verifier construction");
    assert!(verifier.verify_proofs(&[last], &proofs));
}

#[test]
fn test_mixed_boundary_challenges() {
    let sector = build_sector(1 << 20);
    let last = sector.prover.params().data_count - 1;
    let challenges = [0, 1, 2, last];
    let proofs = sector.prover.generate_proofs(&challenges);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 20, sector.prover.mkl_root())
        .expect("verifier construction");
    assert!(verifier.verify_proofs(&challenges, &proofs));

    // Challenge 1 is odd, so its predecessor is the level-0 Merkle sibling.
    assert_eq!(proofs[1].node_cx, proofs[1].mkl_path[0]);
}

#[test]
fn test_duplicate_challenges_yield_identical_proofs() {
    let sector = build_sector(1 << 20);
    let proofs = sector.prover.generate_proofs(&[42, 42]);
    assert_eq!(proofs[0], proofs[1]);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 20, sector.prover.mkl_root())
        .expect("verifier construction");
    assert!(verifier.verify_proofs(&[42, 42], &proofs));
}

#[test]
fn test_challenges_reduce_mod_leaf_count() {
    let sector = build_sector(1 << 11);
    let n = sector.prover.params().data_count;

    let wrapped = sector.prover.generate_proofs(&[n + 5, 5]);
    assert_eq!(wrapped[0], wrapped[1]);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 11, sector.prover.mkl_root())
        .expect("verifier construction");
    assert!(verifier.verify_proofs(&[n + 5], &wrapped[..1]));
}

#[test]
fn test_packed_round_trip() {
    let sector = build_sector(1 << 20);
    let challenges = [7, 11];
    let proofs = sector.prover.generate_proofs(&challenges);
    let packed = sector.prover.pack_proofs(&proofs);

    let verifier = SectorVerifier::new(USER_ID, SECTOR_ID, 1 << 20, sector.prover.mkl_root())
        .expect("verifier construction");
    assert_eq!(verifier.unpack_proofs(&packed), proofs);
    assert!(verifier.verify_packed_proofs(&challenges, &packed));

    let direct = sector.prover.generate_packed_proofs(&challenges);
    assert!(verifier.verify_packed_proofs(&challenges, &direct));
}

#[test]
fn test_reopen_is_idempotent_and_root_stable() {
    let sector = build_sector(1 << 12);
    let root = sector.prover.mkl_root();

    let mut reopened = sector.reopen();
    assert!(reopened.open(IntegrityCheck::None));
    assert_eq!(reopened.mkl_root(), root);

    let mut checked = sector.reopen();
    assert!(checked.open(IntegrityCheck::Full));
    assert_eq!(checked.mkl_root(), root);

    let mut fast = sector.reopen();
    assert!(fast.open(IntegrityCheck::Fast));
}

#[test]
fn test_sector_build_is_deterministic() {
    let a = build_sector(1 << 12);
    let b = build_sector(1 << 12);

    let data_a = std::fs::read(a.data_path()).unwrap();
    let data_b = std::fs::read(b.data_path()).unwrap();
    assert_eq!(data_a, data_b);

    let meta_a = std::fs::read(a.meta_path()).unwrap();
    let meta_b = std::fs::read(b.meta_path()).unwrap();
    assert_eq!(meta_a, meta_b);
}

#[test]
fn test_different_identity_different_sector() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = SectorProver::new("abcd", "1234", 1 << 12, dir.path()).unwrap();
    assert!(a.create(&|_, _| {}));

    let dir2 = tempfile::tempdir().unwrap();
    let mut b = SectorProver::new("abcd", "4321", 1 << 12, dir2.path()).unwrap();
    assert!(b.create(&|_, _| {}));

    assert_ne!(a.mkl_root(), b.mkl_root());
}

#[test]
fn test_constructor_validations() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        SectorProver::new(USER_ID, SECTOR_ID, 3000, dir.path()),
        Err(SectorError::InvalidDataSize { .. })
    ));
    assert!(matches!(
        SectorProver::new(USER_ID, SECTOR_ID, 1 << 10, dir.path()),
        Err(SectorError::DataSizeTooSmall { .. })
    ));
    assert!(matches!(
        SectorProver::new(USER_ID, SECTOR_ID, 1 << 12, dir.path().join("missing")),
        Err(SectorError::InvalidPath { .. })
    ));
}

#[test]
fn test_open_without_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut prover = SectorProver::new(USER_ID, SECTOR_ID, 1 << 12, dir.path()).unwrap();
    assert!(!prover.open(IntegrityCheck::None));
}

#[test]
fn test_open_rejects_wrong_size() {
    let sector = build_sector(1 << 12);

    // A prover constructed for a different (still valid) size must refuse
    // the existing files.
    let mut wrong = SectorProver::new(USER_ID, SECTOR_ID, 1 << 13, sector.dir.path()).unwrap();
    assert!(!wrong.open(IntegrityCheck::None));
}

#[test]
fn test_create_refuses_when_opened() {
    let mut sector = build_sector(1 << 12);
    assert!(!sector.prover.create(&|_, _| {}));

    let mut reopened = sector.reopen();
    assert!(reopened.open(IntegrityCheck::None));
    assert!(!reopened.open(IntegrityCheck::None));
}

#[test]
#[should_panic(expected = "empty challenges")]
fn test_generate_proofs_panics_on_empty() {
    let sector = build_sector(1 << 12);
    let _ = sector.prover.generate_proofs(&[]);
}

#[test]
#[should_panic(expected = "sector not opened")]
fn test_generate_proofs_panics_when_not_opened() {
    let sector = build_sector(1 << 12);
    let unopened = sector.reopen();
    let _ = unopened.generate_proofs(&[0]);
}

#[test]
#[should_panic(expected = "sector not opened")]
fn test_mkl_root_panics_when_not_opened() {
    let sector = build_sector(1 << 12);
    let unopened = sector.reopen();
    let _ = unopened.mkl_root();
}

#[test]
fn test_proof_file_round_trip_with_sector() {
    let sector = build_sector(1 << 12);
    let challenges = [3, 9];
    let proofs = sector.prover.generate_proofs(&challenges);

    let path = sector.dir.path().join("pos_proof.bin");
    pospace_crypto::save_proof_file(
        &path,
        USER_ID,
        SECTOR_ID,
        &sector.prover.mkl_root(),
        &challenges,
        &proofs,
    )
    .expect("proof file write");

    let bytes = std::fs::read(&path).unwrap();
    let record = 8 + sector.prover.params().proof_size_bytes();
    assert_eq!(bytes.len(), 64 + challenges.len() * record);
    assert_eq!(&bytes[32..64], &sector.prover.mkl_root().to_bytes());
}
