//! Multi-stage dataset loader: remote endpoint → local file → synthetic sample.
//!
//! Each source is attempted in priority order. I/O and parse errors at one
//! stage are logged and recorded, then control falls through to the next
//! source; only exhaustion of the whole chain is reported to the caller, as
//! [`ResaleError::SourcesExhausted`].

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, Local, Months, NaiveDate};
use encoding_rs::Encoding;
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use rand::prelude::*;
use reqwest::blocking::Client;

use crate::config;
use crate::error::{ResaleError, Result};
use crate::model::{DataSource, Dataset, Transaction};

/// Resolves a dataset from the configured sources.
///
/// Holds no dataset itself; memoization of the result lives in
/// [`crate::cache::DatasetCache`].
pub struct Loader {
    url: Option<String>,
    local_path: PathBuf,
    timeout: Duration,
    /// If true, never touch the network (local file and synthetic only).
    pub offline: bool,
    /// If false, exhaustion of the real sources is a terminal error instead
    /// of engaging the fabricated sample.
    pub synthetic_fallback: bool,
    client: Option<Client>,
}

impl Loader {
    pub fn new(
        url: Option<String>,
        local_path: Option<PathBuf>,
        timeout: Duration,
        offline: bool,
        synthetic_fallback: bool,
    ) -> Self {
        Self {
            url,
            local_path: local_path.unwrap_or_else(config::default_data_path),
            timeout,
            offline,
            synthetic_fallback,
            client: None,
        }
    }

    /// Cache key for the memoization layer: the parameters that determine
    /// which data this loader would produce.
    pub fn source_key(&self) -> (Option<String>, PathBuf) {
        (self.url.clone(), self.local_path.clone())
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            self.client = Some(
                Client::builder()
                    .timeout(self.timeout)
                    .redirect(reqwest::redirect::Policy::limited(10))
                    .build()?,
            );
        }
        Ok(self.client.as_ref().unwrap())
    }

    /// Resolve a dataset, walking the source chain.
    ///
    /// Returns the first source that yields at least one cleaned record.
    /// A source that is unreachable, undecodable, schema-less, or empty is
    /// recorded and skipped. When everything real fails and the synthetic
    /// fallback is enabled, a fabricated sample flagged
    /// [`DataSource::Synthetic`] is returned instead.
    pub fn load(&mut self) -> Result<Dataset> {
        let mut attempts: Vec<String> = Vec::new();

        // 1. Remote endpoint
        if self.offline {
            attempts.push("remote: skipped (offline mode)".to_string());
        } else if let Some(url) = self.url.clone() {
            match self.fetch_remote(&url) {
                Ok(records) if !records.is_empty() => {
                    info!("loaded {} transactions from {}", records.len(), url);
                    return Ok(Dataset::new(records, DataSource::Remote { url }));
                }
                Ok(_) => {
                    warn!("remote {url} returned no usable rows");
                    attempts.push(format!("remote {url}: no usable rows"));
                }
                Err(e) => {
                    warn!("remote {url} failed: {e}");
                    attempts.push(format!("remote {url}: {e}"));
                }
            }
        } else {
            attempts.push("remote: no URL configured".to_string());
        }

        // 2. Local file
        let path = self.local_path.clone();
        match self.read_local(&path) {
            Ok(records) if !records.is_empty() => {
                info!("loaded {} transactions from {}", records.len(), path.display());
                return Ok(Dataset::new(records, DataSource::LocalFile { path }));
            }
            Ok(_) => {
                warn!("local file {} is present but empty", path.display());
                attempts.push(format!("local file {}: present but empty", path.display()));
            }
            Err(e) => {
                warn!("local file {} failed: {e}", path.display());
                attempts.push(format!("local file {}: {e}", path.display()));
            }
        }

        // 3. Synthetic sample
        if self.synthetic_fallback {
            warn!("no real data source available; generating synthetic sample");
            return Ok(synthetic_sample());
        }
        attempts.push("synthetic fallback: disabled".to_string());

        Err(ResaleError::SourcesExhausted { attempts })
    }

    // -- Remote ------------------------------------------------------------

    fn fetch_remote(&mut self, url: &str) -> Result<Vec<Transaction>> {
        let client = self.client()?.clone();
        let resp = client.get(url).send()?.error_for_status()?;
        let body = resp.text()?;
        parse_payload(&body)
    }

    // -- Local file --------------------------------------------------------

    fn read_local(&self, path: &Path) -> Result<Vec<Transaction>> {
        if !path.exists() {
            return Err(ResaleError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "file or containing directory does not exist",
            )));
        }

        let raw = fs::read(path)?;
        let raw = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            let mut decoder = GzDecoder::new(raw.as_slice());
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            out
        } else {
            raw
        };

        let text = decode_text(&raw);
        parse_payload(&text)
    }
}

/// Decode raw bytes using the configured encoding chain.
///
/// A BOM, when present, wins outright. Otherwise the first encoding that
/// decodes without error is used. The chain ends in Windows-1252, which
/// accepts any byte sequence, so the trailing lossy UTF-8 pass is reached
/// only with a reconfigured chain.
fn decode_text(raw: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(raw) {
        let (text, _) = encoding.decode_without_bom_handling(&raw[bom_len..]);
        return text.into_owned();
    }
    for encoding in config::encoding_chain() {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(raw) {
            debug!("decoded local payload as {}", encoding.name());
            return text.into_owned();
        }
    }
    debug!("no encoding decoded cleanly; falling back to lossy UTF-8");
    String::from_utf8_lossy(raw).into_owned()
}

// ---------------------------------------------------------------------------
// Payload parsing (shared by remote and local sources)
// ---------------------------------------------------------------------------

/// Parse a text payload into cleaned transactions.
///
/// The payload is either delimited tabular text with a header row, or a JSON
/// document in the data.gov.sg datastore shape
/// (`{"result": {"records": [...]}}`, or a bare array of records).
fn parse_payload(text: &str) -> Result<Vec<Transaction>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        parse_json_records(trimmed)
    } else {
        parse_delimited(text)
    }
}

/// Map a source header to its canonical column name, if it is one we know.
fn canonical_column(header: &str) -> Option<&'static str> {
    let normalized = header.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    for (canonical, aliases) in config::column_aliases() {
        if aliases.contains(&normalized.as_str()) {
            return Some(canonical);
        }
    }
    None
}

fn parse_delimited(text: &str) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    // Rename source headers to the canonical schema
    let mut columns: HashMap<&'static str, usize> = HashMap::new();
    for (idx, header) in reader.headers()?.iter().enumerate() {
        if let Some(canonical) = canonical_column(header) {
            columns.entry(canonical).or_insert(idx);
        }
    }
    require_columns(columns.contains_key("date"), columns.contains_key("price"))?;

    let date_idx = columns["date"];
    let price_idx = columns["price"];
    let region_idx = columns.get("region").copied();
    let ptype_idx = columns.get("property_type").copied();
    let id_idx = columns.get("transaction_id").copied();

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = row?;
        let get = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
        match clean_row(
            get(Some(date_idx)),
            get(Some(price_idx)),
            get(region_idx),
            get(ptype_idx),
            get(id_idx),
        ) {
            Some(tx) => records.push(tx),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("dropped {dropped} rows with unparseable date or price");
    }
    Ok(records)
}

fn parse_json_records(text: &str) -> Result<Vec<Transaction>> {
    let root: serde_json::Value = serde_json::from_str(text)?;
    let rows = root
        .get("result")
        .and_then(|r| r.get("records"))
        .or_else(|| Some(&root))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            ResaleError::Schema("JSON payload has no records array".to_string())
        })?;

    // Field lookup by canonical name across a record's (aliased) keys
    let field = |row: &serde_json::Value, canonical: &str| -> String {
        row.as_object()
            .and_then(|obj| {
                obj.iter()
                    .find(|(k, _)| canonical_column(k) == Some(canonical))
                    .map(|(_, v)| json_value_to_string(v))
            })
            .unwrap_or_default()
    };

    let mut saw_date = false;
    let mut saw_price = false;
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in rows {
        let date = field(row, "date");
        let price = field(row, "price");
        saw_date |= !date.is_empty();
        saw_price |= !price.is_empty();
        match clean_row(
            &date,
            &price,
            &field(row, "region"),
            &field(row, "property_type"),
            &field(row, "transaction_id"),
        ) {
            Some(tx) => records.push(tx),
            None => dropped += 1,
        }
    }

    if !rows.is_empty() {
        require_columns(saw_date, saw_price)?;
    }
    if dropped > 0 {
        debug!("dropped {dropped} JSON records with unparseable date or price");
    }
    Ok(records)
}

fn json_value_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn require_columns(has_date: bool, has_price: bool) -> Result<()> {
    let mut missing = Vec::new();
    if !has_date {
        missing.push("date");
    }
    if !has_price {
        missing.push("price");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ResaleError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

/// Clean one raw row into a transaction, or `None` if the row must be
/// dropped (invalid date, non-numeric/negative price). Missing categorical
/// fields are backfilled with the sentinel rather than dropped.
fn clean_row(
    date: &str,
    price: &str,
    region: &str,
    property_type: &str,
    transaction_id: &str,
) -> Option<Transaction> {
    let date = parse_date(date)?;
    let price = parse_price(price)?;
    Some(Transaction {
        date,
        region: backfill(region),
        property_type: backfill(property_type),
        price,
        transaction_id: if transaction_id.is_empty() {
            None
        } else {
            Some(transaction_id.to_string())
        },
    })
}

fn backfill(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        config::UNKNOWN_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a transaction date: full day (`2024-01-15`), calendar month
/// (`2024-01`, pinned to day 1), or `15/01/2024`.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// Coerce a price cell to a finite, non-negative f64. Tolerates currency
/// prefixes and thousands separators (`S$512,000`).
fn parse_price(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches("S$")
        .trim_start_matches('$')
        .replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Synthetic sample
// ---------------------------------------------------------------------------

/// Fabricate a placeholder dataset so the dashboard has something to render
/// when no real source is available: a fixed grid of regions × property
/// types × trailing monthly dates, with a base price per cell plus bounded
/// random variation.
fn synthetic_sample() -> Dataset {
    let mut rng = thread_rng();
    let this_month = Local::now()
        .date_naive()
        .with_day(1)
        .expect("day 1 is valid for every month");

    let mut records = Vec::new();
    for months_back in (0..config::SAMPLE_MONTHS).rev() {
        let date = this_month
            .checked_sub_months(Months::new(months_back))
            .expect("sample window stays within the calendar");
        for (r, region) in config::SAMPLE_REGIONS.iter().enumerate() {
            for (t, property_type) in config::SAMPLE_PROPERTY_TYPES.iter().enumerate() {
                let base = config::SAMPLE_BASE_PRICE
                    + r as f64 * config::SAMPLE_REGION_STEP
                    + t as f64 * config::SAMPLE_TYPE_STEP;
                let jitter =
                    rng.gen_range(-config::SAMPLE_PRICE_JITTER..=config::SAMPLE_PRICE_JITTER);
                records.push(Transaction {
                    date,
                    region: region.to_string(),
                    property_type: property_type.to_string(),
                    price: (base + jitter).max(0.0),
                    transaction_id: None,
                });
            }
        }
    }

    Dataset::new(records, DataSource::Synthetic)
}
