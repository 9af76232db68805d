//! Core data model: transactions, datasets, filter selections, and the
//! derived views handed to the rendering layer.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config;
use crate::error::{ResaleError, Result};

// ---------------------------------------------------------------------------
// Transaction — the unit entity
// ---------------------------------------------------------------------------

/// A single property transaction, cleaned to the canonical schema.
///
/// Invariant: `date` is valid and `price` is finite and non-negative. Rows
/// that cannot satisfy this are dropped during loading, never retained with
/// placeholder values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub region: String,
    pub property_type: String,
    /// Total transaction price in S$.
    pub price: f64,
    /// Source identifier, used only for counting volume.
    pub transaction_id: Option<String>,
}

// ---------------------------------------------------------------------------
// DataSource — where a dataset came from
// ---------------------------------------------------------------------------

/// Provenance of a loaded dataset.
///
/// `Synthetic` marks fabricated placeholder data; callers must surface this
/// to the user so fabricated numbers are never mistaken for real ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Remote { url: String },
    LocalFile { path: PathBuf },
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The full cleaned dataset. Built once by the loader and immutable
/// thereafter; all filtering produces derived views.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub records: Vec<Transaction>,
    pub source: DataSource,
}

impl Dataset {
    pub fn new(records: Vec<Transaction>, source: DataSource) -> Self {
        Self { records, source }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date of the most recent transaction, if any ("Last Updated" line).
    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.records.iter().map(|t| t.date).max()
    }
}

// ---------------------------------------------------------------------------
// FilterSelection
// ---------------------------------------------------------------------------

/// User-selected filter state for one render cycle.
///
/// `None` (or the literal `"All"`, case-insensitive) means no restriction for
/// the categorical filters. `window_months` restricts to transactions no
/// older than N months before the as-of date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSelection {
    pub property_type: Option<String>,
    pub region: Option<String>,
    pub window_months: u32,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            property_type: None,
            region: None,
            window_months: config::MAX_WINDOW_MONTHS,
        }
    }
}

impl FilterSelection {
    /// Ensure `window_months` is within the supported range.
    pub fn validate(&self) -> Result<()> {
        if self.window_months < config::MIN_WINDOW_MONTHS
            || self.window_months > config::MAX_WINDOW_MONTHS
        {
            return Err(ResaleError::InvalidArgument(format!(
                "window_months must be between {} and {}, got {}",
                config::MIN_WINDOW_MONTHS,
                config::MAX_WINDOW_MONTHS,
                self.window_months
            )));
        }
        Ok(())
    }
}

/// True when a categorical selector imposes no restriction.
pub(crate) fn is_all(selection: &Option<String>) -> bool {
    match selection {
        None => true,
        Some(s) => s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all"),
    }
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// One point of the average-price-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub mean_price: f64,
}

/// One point of the transaction-volume-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub count: usize,
}

/// Per-region summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub mean_price: f64,
    pub count: usize,
    /// Chronologically last price in the group.
    pub latest_price: f64,
    /// Period-over-period change `(last - first) / first` over the group's
    /// chronologically ordered prices. `None` for single-record groups or a
    /// zero first price.
    pub change: Option<f64>,
}

/// The three views rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub price_trend: Vec<PricePoint>,
    pub volume_trend: Vec<VolumePoint>,
    pub region_summary: Vec<RegionSummary>,
}

/// Outcome of one pipeline run.
///
/// Emptiness after filtering is a first-class state: the rendering layer is
/// expected to show a distinct "no rows matched" message rather than blank
/// charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutput {
    Ready(DashboardFrame),
    Empty,
}

impl PipelineOutput {
    pub fn is_empty(&self) -> bool {
        matches!(self, PipelineOutput::Empty)
    }

    pub fn frame(&self) -> Option<&DashboardFrame> {
        match self {
            PipelineOutput::Ready(frame) => Some(frame),
            PipelineOutput::Empty => None,
        }
    }
}
