//! Resale transaction SDK for Rust.
//!
//! Loads a property-transaction dataset for dashboard rendering — from the
//! data.gov.sg resale endpoint, a local file, or a clearly flagged synthetic
//! sample — then filters it by property type, region, and trailing time
//! window, and aggregates it into the three views a dashboard renders:
//! average price over time, transaction volume over time, and a per-region
//! summary table.
//!
//! # Quick start
//!
//! ```no_run
//! use resale_sdk::{FilterSelection, PipelineOutput, ResaleSdk};
//!
//! let sdk = ResaleSdk::builder().build();
//!
//! let selection = FilterSelection {
//!     property_type: Some("Resale".to_string()),
//!     region: None,
//!     window_months: 12,
//! };
//!
//! match sdk.dashboard(&selection).unwrap() {
//!     PipelineOutput::Ready(frame) => println!("{} regions", frame.region_summary.len()),
//!     PipelineOutput::Empty => println!("filters matched no transactions"),
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;

pub use cache::DatasetCache;
pub use error::{ResaleError, Result};
pub use loader::Loader;
pub use model::{
    DashboardFrame, DataSource, Dataset, FilterSelection, PipelineOutput, PricePoint,
    RegionSummary, Transaction, VolumePoint,
};
pub use pipeline::Pipeline;

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// ResaleSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`ResaleSdk`] instance.
///
/// Use [`ResaleSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](ResaleSdkBuilder::build).
pub struct ResaleSdkBuilder {
    url: Option<String>,
    local_path: Option<PathBuf>,
    timeout: Duration,
    offline: bool,
    synthetic_fallback: bool,
}

impl Default for ResaleSdkBuilder {
    fn default() -> Self {
        Self {
            url: Some(config::DATASET_URL.to_string()),
            local_path: None,
            timeout: config::DEFAULT_TIMEOUT,
            offline: false,
            synthetic_fallback: true,
        }
    }
}

impl ResaleSdkBuilder {
    /// Override the remote dataset URL.
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Remove the remote source entirely (local file and synthetic only).
    pub fn no_remote(mut self) -> Self {
        self.url = None;
        self
    }

    /// Set the local dataset file path.
    ///
    /// Defaults to `resale-transactions.csv` in the platform data directory.
    pub fn local_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.local_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the HTTP request timeout for the remote fetch. A fetch exceeding
    /// it is treated as a normal failed source, not a fault.
    ///
    /// Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable offline mode. When offline, the SDK never touches
    /// the network. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Allow or forbid the synthetic-sample fallback. When forbidden,
    /// exhausting the real sources is a terminal
    /// [`ResaleError::SourcesExhausted`]. Defaults to `true`.
    pub fn synthetic_fallback(mut self, allow: bool) -> Self {
        self.synthetic_fallback = allow;
        self
    }

    /// Build the SDK. No I/O happens here; the dataset is loaded lazily on
    /// first access and memoized.
    pub fn build(self) -> ResaleSdk {
        let loader = Loader::new(
            self.url,
            self.local_path,
            self.timeout,
            self.offline,
            self.synthetic_fallback,
        );
        ResaleSdk {
            loader: RefCell::new(loader),
            cache: RefCell::new(DatasetCache::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// ResaleSdk
// ---------------------------------------------------------------------------

/// The main entry point: owns the loader and the memoized dataset, and hands
/// the filter/aggregate pipeline the current dataset on each render cycle.
///
/// Created via [`ResaleSdk::builder()`]. Single-threaded by design — one
/// logical caller per render cycle, no locking.
pub struct ResaleSdk {
    loader: RefCell<Loader>,
    cache: RefCell<DatasetCache>,
}

impl ResaleSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> ResaleSdkBuilder {
        ResaleSdkBuilder::default()
    }

    /// The loaded dataset, running the source chain on first access only.
    ///
    /// Check [`Dataset::source`] before rendering: a
    /// [`DataSource::Synthetic`] dataset is fabricated placeholder content
    /// and the user must be warned.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.cache
            .borrow_mut()
            .get_or_load(&mut self.loader.borrow_mut())
    }

    /// Run the filter/aggregate pipeline against the (memoized) dataset with
    /// the trailing window anchored at today.
    pub fn dashboard(&self, selection: &FilterSelection) -> Result<PipelineOutput> {
        let dataset = self.dataset()?;
        Pipeline::new(&dataset).run(selection)
    }

    /// As [`dashboard`](Self::dashboard), with an explicit as-of date.
    pub fn dashboard_as_of(
        &self,
        selection: &FilterSelection,
        as_of: NaiveDate,
    ) -> Result<PipelineOutput> {
        let dataset = self.dataset()?;
        Pipeline::new(&dataset).run_as_of(selection, as_of)
    }

    /// Top `n` regions by mean price under the given selection, anchored at
    /// the given as-of date.
    pub fn top_regions(
        &self,
        selection: &FilterSelection,
        n: usize,
        as_of: NaiveDate,
    ) -> Result<Vec<RegionSummary>> {
        let dataset = self.dataset()?;
        Pipeline::new(&dataset).top_regions(selection, n, as_of)
    }

    /// Drop the memoized dataset so the next access re-runs the source chain.
    pub fn refresh(&self) {
        self.cache.borrow_mut().invalidate();
    }

    /// Whether a dataset has been loaded and memoized.
    pub fn is_loaded(&self) -> bool {
        self.cache.borrow().is_populated()
    }
}

impl fmt::Display for ResaleSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loader = self.loader.borrow();
        write!(
            f,
            "ResaleSdk(loaded={}, offline={}, synthetic_fallback={})",
            self.is_loaded(),
            loader.offline,
            loader.synthetic_fallback
        )
    }
}
