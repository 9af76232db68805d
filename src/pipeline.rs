//! Filter and aggregation pipeline: dataset + filter selection → the three
//! derived views (price trend, volume trend, region summary).
//!
//! Deterministic and side-effect-free: the dataset is never mutated, and two
//! runs with the same selection and as-of date produce identical output.

use std::collections::BTreeMap;

use chrono::{Local, Months, NaiveDate};

use crate::model::{
    is_all, DashboardFrame, Dataset, FilterSelection, PipelineOutput, PricePoint, RegionSummary,
    Transaction, VolumePoint,
};
use crate::error::Result;

/// Query interface over a loaded dataset. Borrows the dataset; constructed
/// per render cycle, either directly or through
/// [`crate::ResaleSdk::dashboard`].
pub struct Pipeline<'a> {
    dataset: &'a Dataset,
}

impl<'a> Pipeline<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Run the full pipeline with the window anchored at today.
    pub fn run(&self, selection: &FilterSelection) -> Result<PipelineOutput> {
        self.run_as_of(selection, Local::now().date_naive())
    }

    /// Run the full pipeline with an explicit as-of date for the trailing
    /// window. An empty filtered set yields [`PipelineOutput::Empty`], never
    /// empty aggregate sequences.
    pub fn run_as_of(
        &self,
        selection: &FilterSelection,
        as_of: NaiveDate,
    ) -> Result<PipelineOutput> {
        let survivors = self.filtered(selection, as_of)?;
        if survivors.is_empty() {
            return Ok(PipelineOutput::Empty);
        }
        Ok(PipelineOutput::Ready(DashboardFrame {
            price_trend: average_price_over_time(&survivors),
            volume_trend: volume_over_time(&survivors),
            region_summary: region_summaries(&survivors),
        }))
    }

    /// The first `n` region-summary rows (highest mean price first), for the
    /// dashboard's top-regions cards. Empty when the filters match nothing.
    pub fn top_regions(
        &self,
        selection: &FilterSelection,
        n: usize,
        as_of: NaiveDate,
    ) -> Result<Vec<RegionSummary>> {
        let survivors = self.filtered(selection, as_of)?;
        let mut rows = region_summaries(&survivors);
        rows.truncate(n);
        Ok(rows)
    }

    /// Apply the three filters (logical AND) and return surviving records.
    fn filtered(
        &self,
        selection: &FilterSelection,
        as_of: NaiveDate,
    ) -> Result<Vec<&'a Transaction>> {
        selection.validate()?;

        let cutoff = as_of
            .checked_sub_months(Months::new(selection.window_months))
            .unwrap_or(NaiveDate::MIN);
        let property_needle = selection
            .property_type
            .as_ref()
            .filter(|_| !is_all(&selection.property_type))
            .map(|s| s.to_lowercase());
        let region_filter = selection
            .region
            .as_ref()
            .filter(|_| !is_all(&selection.region));

        Ok(self
            .dataset
            .records
            .iter()
            .filter(|tx| tx.date >= cutoff)
            .filter(|tx| match &property_needle {
                // Substring match, so "Resale" also matches "HDB Resale"
                Some(needle) => tx.property_type.to_lowercase().contains(needle),
                None => true,
            })
            .filter(|tx| match region_filter {
                Some(region) => tx.region == *region,
                None => true,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

fn average_price_over_time(records: &[&Transaction]) -> Vec<PricePoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for tx in records {
        let entry = by_date.entry(tx.date).or_insert((0.0, 0));
        entry.0 += tx.price;
        entry.1 += 1;
    }
    by_date
        .into_iter()
        .map(|(date, (sum, count))| PricePoint {
            date,
            mean_price: sum / count as f64,
        })
        .collect()
}

fn volume_over_time(records: &[&Transaction]) -> Vec<VolumePoint> {
    let mut by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for tx in records {
        *by_date.entry(tx.date).or_insert(0) += 1;
    }
    by_date
        .into_iter()
        .map(|(date, count)| VolumePoint { date, count })
        .collect()
}

fn region_summaries(records: &[&Transaction]) -> Vec<RegionSummary> {
    let mut by_region: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for &tx in records {
        by_region.entry(tx.region.as_str()).or_default().push(tx);
    }

    let mut rows: Vec<RegionSummary> = by_region
        .into_iter()
        .map(|(region, mut group)| {
            // Stable sort keeps source order within a date
            group.sort_by_key(|tx| tx.date);
            let count = group.len();
            let sum: f64 = group.iter().map(|tx| tx.price).sum();
            let first = group.first().map(|tx| tx.price).unwrap_or(0.0);
            let latest = group.last().map(|tx| tx.price).unwrap_or(0.0);
            let change = if count > 1 && first != 0.0 {
                Some((latest - first) / first)
            } else {
                None
            };
            RegionSummary {
                region: region.to_string(),
                mean_price: sum / count as f64,
                count,
                latest_price: latest,
                change,
            }
        })
        .collect();

    // Highest average price first; region name breaks ties deterministically
    rows.sort_by(|a, b| {
        b.mean_price
            .total_cmp(&a.mean_price)
            .then_with(|| a.region.cmp(&b.region))
    });
    rows
}
