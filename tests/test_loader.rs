//! Loader integration tests: source chain, column renaming, cleaning,
//! encodings, and fallback behavior.

mod common;

use std::io::Write;
use std::time::Duration;

use resale_sdk::{DataSource, ResaleError, ResaleSdk};

// ---------------------------------------------------------------------------
// Well-formed local files
// ---------------------------------------------------------------------------

#[test]
fn loads_canonical_csv() {
    let (_dir, sdk) = common::sample_sdk();

    let dataset = sdk.dataset().unwrap();
    assert_eq!(dataset.len(), 5);
    assert!(matches!(dataset.source, DataSource::LocalFile { .. }));
    assert_eq!(
        dataset.last_updated(),
        Some(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    );
}

#[test]
fn renames_hdb_style_headers() {
    let csv = "\
month,town,flat_type,resale_price
2024-01,ANG MO KIO,4 ROOM,512000
2024-02,BEDOK,5 ROOM,638000
";
    let (_dir, path) = common::write_fixture("hdb.csv", csv.as_bytes());
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.len(), 2);
    let first = &dataset.records[0];
    assert_eq!(first.date, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(first.region, "ANG MO KIO");
    assert_eq!(first.property_type, "4 ROOM");
    assert_eq!(first.price, 512000.0);
}

#[test]
fn parses_datastore_json_payload() {
    let json = serde_json::json!({
        "result": {
            "records": [
                {"month": "2024-01", "town": "CLEMENTI", "flat_type": "3 ROOM", "resale_price": "410000"},
                {"month": "2024-02", "town": "CLEMENTI", "flat_type": "3 ROOM", "resale_price": 425000},
            ]
        }
    });
    let (_dir, path) = common::write_fixture("payload.json", json.to_string().as_bytes());
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.records[0].region, "CLEMENTI");
    assert_eq!(dataset.records[1].price, 425000.0);
}

// ---------------------------------------------------------------------------
// Cleaning and normalization
// ---------------------------------------------------------------------------

#[test]
fn drops_rows_with_invalid_date_or_price() {
    let csv = "\
date,region,property_type,price
2024-01-01,A,Flat,100
not-a-date,A,Flat,100
2024-02-01,A,Flat,abc
2024-03-01,A,Flat,-50
2024-04-01,A,Flat,200
";
    let (_dir, path) = common::write_fixture("dirty.csv", csv.as_bytes());
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.len(), 2);
    assert!(dataset.records.iter().all(|t| t.price.is_finite() && t.price >= 0.0));
}

#[test]
fn backfills_missing_categories_with_unknown() {
    let csv = "\
date,region,property_type,price
2024-01-01,,,100
";
    let (_dir, path) = common::write_fixture("sparse.csv", csv.as_bytes());
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.records[0].region, "Unknown");
    assert_eq!(dataset.records[0].property_type, "Unknown");
}

#[test]
fn coerces_formatted_prices() {
    let csv = "\
date,region,property_type,price
2024-01-01,A,Flat,\"S$512,000\"
";
    let (_dir, path) = common::write_fixture("formatted.csv", csv.as_bytes());
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.records[0].price, 512000.0);
}

#[test]
fn missing_price_column_is_a_schema_error() {
    let csv = "\
date,region,property_type
2024-01-01,A,Flat
";
    let (_dir, path) = common::write_fixture("no_price.csv", csv.as_bytes());
    let err = common::sdk_for_file(&path).dataset().unwrap_err();

    match err {
        ResaleError::SourcesExhausted { attempts } => {
            assert!(
                attempts.iter().any(|a| a.contains("missing required column(s): price")),
                "attempts did not report the missing column: {attempts:?}"
            );
        }
        other => panic!("expected SourcesExhausted, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Encodings and compression
// ---------------------------------------------------------------------------

#[test]
fn decodes_windows_1252_files() {
    // 0xE9 is 'é' in Windows-1252 and invalid as a standalone UTF-8 byte
    let mut bytes = b"date,region,property_type,price\n2024-01-01,Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b",Flat,100\n");

    let (_dir, path) = common::write_fixture("legacy.csv", &bytes);
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.records[0].region, "Café");
}

#[test]
fn decodes_utf16le_files_with_bom() {
    let text = "date,region,property_type,price\n2024-01-01,A,Flat,100\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let (_dir, path) = common::write_fixture("utf16.csv", &bytes);
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.records[0].region, "A");
}

#[test]
fn decompresses_gzipped_files() {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(common::SAMPLE_CSV.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let (_dir, path) = common::write_fixture("transactions.csv.gz", &compressed);
    let dataset = common::sdk_for_file(&path).dataset().unwrap();

    assert_eq!(dataset.len(), 5);
}

// ---------------------------------------------------------------------------
// Fallback chain
// ---------------------------------------------------------------------------

#[test]
fn unreachable_remote_falls_through_to_local_file() {
    let (_dir, path) = common::write_fixture("transactions.csv", common::SAMPLE_CSV.as_bytes());

    // Port 1 on loopback refuses connections immediately
    let sdk = ResaleSdk::builder()
        .url("http://127.0.0.1:1/resale.csv")
        .timeout(Duration::from_secs(2))
        .local_path(&path)
        .synthetic_fallback(false)
        .build();

    let dataset = sdk.dataset().unwrap();
    assert_eq!(dataset.len(), 5);
    assert!(matches!(dataset.source, DataSource::LocalFile { .. }));
}

#[test]
fn empty_file_engages_synthetic_fallback() {
    let (_dir, path) = common::write_fixture("empty.csv", b"");

    let sdk = ResaleSdk::builder()
        .no_remote()
        .local_path(&path)
        .synthetic_fallback(true)
        .build();

    let dataset = sdk.dataset().unwrap();
    assert!(dataset.source.is_synthetic());
    assert!(!dataset.is_empty());
    // Deterministic shape: every sample region appears
    for region in ["Ang Mo Kio", "Bedok", "Clementi", "Punggol", "Woodlands"] {
        assert!(dataset.records.iter().any(|t| t.region == region));
    }
}

#[test]
fn exhaustion_reports_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope").join("transactions.csv");

    let sdk = ResaleSdk::builder()
        .no_remote()
        .local_path(&missing)
        .synthetic_fallback(false)
        .build();

    match sdk.dataset().unwrap_err() {
        ResaleError::SourcesExhausted { attempts } => {
            assert_eq!(attempts.len(), 3, "remote, local, synthetic: {attempts:?}");
            assert!(attempts[0].contains("remote"));
            assert!(attempts[1].contains("does not exist"));
            assert!(attempts[2].contains("synthetic"));
        }
        other => panic!("expected SourcesExhausted, got {other:?}"),
    }
}
