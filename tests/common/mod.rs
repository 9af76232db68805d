#![allow(dead_code)] // not every test binary uses every fixture

//! Shared test fixtures for the resale SDK integration tests.
//!
//! Provides on-disk CSV fixtures in temp directories and an SDK wired to
//! load only from a given local file (no remote, no synthetic fallback),
//! so every test is deterministic and network-free.

use std::path::PathBuf;

use resale_sdk::ResaleSdk;
use tempfile::TempDir;

/// Canonical five-row fixture spanning three regions.
///
/// Region means: B = 490, C = 300, A = 110. Changes: A = +0.2,
/// B = -0.04, C = None (single record).
pub const SAMPLE_CSV: &str = "\
date,region,property_type,price,transaction_id
2024-01-01,A,HDB Resale,100,t1
2024-02-01,A,HDB Resale,120,t2
2024-01-01,B,Condo,500,t3
2024-02-01,B,Condo,480,t4
2024-03-01,C,HDB Resale,300,t5
";

/// Route the SDK's `log` output through env_logger (`RUST_LOG=debug cargo
/// test` shows the loader's fallthrough decisions). Safe to call from every
/// test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write `contents` to `name` inside a fresh temp dir.
///
/// The caller must keep the `TempDir` alive for the duration of the test so
/// the fixture file is not deleted prematurely.
pub fn write_fixture(name: &str, contents: &[u8]) -> (TempDir, PathBuf) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// An SDK that can only load the given local file: remote source removed and
/// synthetic fallback disabled.
pub fn sdk_for_file(path: &PathBuf) -> ResaleSdk {
    ResaleSdk::builder()
        .no_remote()
        .local_path(path)
        .synthetic_fallback(false)
        .build()
}

/// An SDK over the canonical sample fixture.
pub fn sample_sdk() -> (TempDir, ResaleSdk) {
    let (dir, path) = write_fixture("transactions.csv", SAMPLE_CSV.as_bytes());
    let sdk = sdk_for_file(&path);
    (dir, sdk)
}
