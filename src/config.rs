use std::path::PathBuf;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Published resale-transaction dataset (data.gov.sg, HDB resale flat prices,
/// Jan 2017 onwards).
pub const DATASET_URL: &str =
    "https://data.gov.sg/api/action/datastore_search?resource_id=d_8b84c4ee58e3cfc0ece0d773c8ca6abc&limit=50000";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sentinel category for rows missing a region or property type.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Inclusive bounds for the trailing time-window filter, in months.
pub const MIN_WINDOW_MONTHS: u32 = 1;
pub const MAX_WINDOW_MONTHS: u32 = 120;

/// Source column names accepted for each canonical column, in match order.
/// The canonical schema is `date`, `region`, `property_type`, `price`,
/// `transaction_id`. `price` is the total transaction price in S$; sources
/// publishing `price_per_sqm` are normalized into the same column.
pub fn column_aliases() -> [(&'static str, &'static [&'static str]); 5] {
    [
        ("date", &["date", "month", "transaction_date"]),
        ("region", &["region", "town", "planning_area"]),
        ("property_type", &["property_type", "flat_type", "property_segment"]),
        ("price", &["price", "resale_price", "price_per_sqm", "price_psm"]),
        ("transaction_id", &["transaction_id", "_id", "id"]),
    ]
}

/// Text encodings tried against local files, in priority order. A BOM, when
/// present, overrides the chain. Windows-1252 maps all 256 byte values, so
/// it doubles as the chain's catch-all; the lossy UTF-8 pass after the chain
/// only runs if this list is reconfigured without such an encoding.
pub fn encoding_chain() -> [&'static Encoding; 2] {
    [UTF_8, WINDOWS_1252]
}

/// Default path for the local dataset copy (`resale-transactions.csv` in the
/// platform data directory, or the working directory as a last resort).
pub fn default_data_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("resale-sdk").join("resale-transactions.csv")
    } else {
        PathBuf::from("resale-transactions.csv")
    }
}

// -- Synthetic sample shape --------------------------------------------------

pub const SAMPLE_REGIONS: [&str; 5] =
    ["Ang Mo Kio", "Bedok", "Clementi", "Punggol", "Woodlands"];

pub const SAMPLE_PROPERTY_TYPES: [&str; 3] = ["3 Room", "4 Room", "5 Room"];

/// Months of history generated for the synthetic sample.
pub const SAMPLE_MONTHS: u32 = 24;

/// Base price in S$ for the cheapest sample cell; each region and property
/// type step adds a fixed increment, with bounded random variation on top.
pub const SAMPLE_BASE_PRICE: f64 = 350_000.0;
pub const SAMPLE_REGION_STEP: f64 = 25_000.0;
pub const SAMPLE_TYPE_STEP: f64 = 80_000.0;
pub const SAMPLE_PRICE_JITTER: f64 = 15_000.0;
