//! Memoization tests: the loader's result is computed once per SDK instance
//! and only an explicit refresh re-runs the source chain.

mod common;

use std::sync::Arc;

use resale_sdk::ResaleError;

#[test]
fn loader_performs_io_exactly_once() {
    let (_dir, path) = common::write_fixture("transactions.csv", common::SAMPLE_CSV.as_bytes());
    let sdk = common::sdk_for_file(&path);

    let first = sdk.dataset().unwrap();
    assert!(sdk.is_loaded());

    // Remove the backing file: a second call must not notice
    std::fs::remove_file(&path).unwrap();
    let second = sdk.dataset().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 5);
}

#[test]
fn refresh_invalidates_the_memoized_dataset() {
    let (_dir, path) = common::write_fixture("transactions.csv", common::SAMPLE_CSV.as_bytes());
    let sdk = common::sdk_for_file(&path);

    sdk.dataset().unwrap();
    std::fs::remove_file(&path).unwrap();
    sdk.refresh();
    assert!(!sdk.is_loaded());

    // With the file gone and no other source, the reload fails loudly
    match sdk.dataset().unwrap_err() {
        ResaleError::SourcesExhausted { .. } => {}
        other => panic!("expected SourcesExhausted, got {other:?}"),
    }
}

#[test]
fn refresh_picks_up_new_file_contents() {
    let (_dir, path) = common::write_fixture("transactions.csv", common::SAMPLE_CSV.as_bytes());
    let sdk = common::sdk_for_file(&path);

    assert_eq!(sdk.dataset().unwrap().len(), 5);

    let smaller = "date,region,property_type,price\n2024-05-01,D,Flat,200\n";
    std::fs::write(&path, smaller).unwrap();

    // Still memoized until the explicit invalidation
    assert_eq!(sdk.dataset().unwrap().len(), 5);
    sdk.refresh();
    assert_eq!(sdk.dataset().unwrap().len(), 1);
}
