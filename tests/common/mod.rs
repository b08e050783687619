//! Common test utilities and shared infrastructure.
//!
//! This module provides the scratch-directory sector fixture used across the
//! integration test suite, plus small helpers for tampering with region
//! files.

#![allow(dead_code)]

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use pospace_crypto::{SectorProver, config::{DATA_FILE_EXT, META_FILE_EXT}};
use tempfile::TempDir;

/// Identity used by the end-to-end scenarios.
pub const USER_ID: &str = "abcd";
pub const SECTOR_ID: &str = "1234";

/// A sector built in a scratch directory, opened and ready to prove.
///
/// Field order keeps the prover's maps dropped before the directory.
pub struct TestSector {
    pub prover: SectorProver,
    pub dir: TempDir,
    pub data_size: u64,
}

impl TestSector {
    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join(format!("{SECTOR_ID}.{DATA_FILE_EXT}"))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.path().join(format!("{SECTOR_ID}.{META_FILE_EXT}"))
    }

    /// A fresh prover over the same files, not yet opened.
    pub fn reopen(&self) -> SectorProver {
        SectorProver::new(USER_ID, SECTOR_ID, self.data_size, self.dir.path())
            .expect("prover construction over an existing sector")
    }
}

/// Build a sector of `data_size` bytes under the test identity.
pub fn build_sector(data_size: u64) -> TestSector {
    let dir = tempfile::tempdir().expect("scratch directory");
    let mut prover = SectorProver::new(USER_ID, SECTOR_ID, data_size, dir.path())
        .expect("prover construction");
    assert!(prover.create(&|_, _| {}), "sector create");
    TestSector {
        prover,
        dir,
        data_size,
    }
}

/// Flip one bit of the byte at `offset` in `path`.
pub fn flip_byte(path: &PathBuf, offset: u64) {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .expect("open region file for tampering");
    file.seek(SeekFrom::Start(offset)).expect("seek");
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte).expect("read byte");
    byte[0] ^= 0x01;
    file.seek(SeekFrom::Start(offset)).expect("seek");
    file.write_all(&byte).expect("write byte");
}
