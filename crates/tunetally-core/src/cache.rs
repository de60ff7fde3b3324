use std::collections::HashMap;
use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::{self, PreparedDataset};

/// Prepared datasets keyed by the blake3 hash of their source bytes. Owned by the caller;
/// entries are read-only once inserted.
#[derive(Debug, Default)]
pub struct PreparedCache {
    entries: HashMap<String, Arc<PreparedDataset>>,
}

impl PreparedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_key(source: &[u8]) -> String {
        blake3::hash(source).to_hex().to_string()
    }

    /// Returns the cached dataset for `source`, or loads and prepares it on first use.
    pub fn get_or_prepare<E, F>(
        &mut self,
        source: &[u8],
        load: F,
    ) -> Result<Arc<PreparedDataset>, E>
    where
        F: FnOnce(&[u8]) -> Result<DataFrame, E>,
        E: From<PipelineError>,
    {
        let key = Self::source_key(source);
        if let Some(existing) = self.entries.get(&key) {
            debug!(source_key = key.as_str(), "Prepared dataset cache hit");
            return Ok(Arc::clone(existing));
        }

        let raw = load(source)?;
        let prepared = Arc::new(pipeline::prepare(&raw)?);
        debug!(source_key = key.as_str(), "Prepared dataset cached");
        self.entries.insert(key, Arc::clone(&prepared));
        Ok(prepared)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
