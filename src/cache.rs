//! Memoization of the loader result.
//!
//! The dashboard re-runs the pipeline on every filter change; the underlying
//! dataset must not be re-fetched each time. The cache is keyed on the load
//! parameters (URL + local path), holds at most one dataset, and exposes an
//! explicit invalidation hook rather than relying on process-wide state.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::loader::Loader;
use crate::model::Dataset;

type SourceKey = (Option<String>, PathBuf);

/// Single-slot dataset cache keyed on the loader's source parameters.
#[derive(Default)]
pub struct DatasetCache {
    slot: Option<(SourceKey, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for this loader's sources, running the
    /// loader only on a miss. A loader configured with different sources
    /// than the cached entry evicts it and loads fresh.
    pub fn get_or_load(&mut self, loader: &mut Loader) -> Result<Arc<Dataset>> {
        let key = loader.source_key();
        if let Some((cached_key, dataset)) = &self.slot {
            if *cached_key == key {
                debug!("dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
        }
        let dataset = Arc::new(loader.load()?);
        self.slot = Some((key, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drop the cached dataset so the next access re-runs the loader.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// Whether a dataset is currently cached.
    pub fn is_populated(&self) -> bool {
        self.slot.is_some()
    }
}
