use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::schema::{is_selectable_metric, DEFAULT_ANALYSIS_METRICS};
use crate::types::Granularity;

pub const DEFAULT_FROM_YEAR: i32 = 2014;
pub const DEFAULT_TO_YEAR: i32 = 2024;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 6;
/// Bounds of a selectable year; bucket labels are four-digit years.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Values chosen in the UI layer: year range, metrics, and bucket size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    pub from_year: i32,
    pub to_year: i32,
    pub metrics: Vec<String>,
    pub granularity: Granularity,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            from_year: DEFAULT_FROM_YEAR,
            to_year: DEFAULT_TO_YEAR,
            metrics: DEFAULT_ANALYSIS_METRICS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            granularity: Granularity::default(),
        }
    }
}

impl SelectionParams {
    pub fn validate(&self) -> Result<()> {
        for year in [self.from_year, self.to_year] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(PipelineError::InvalidParameters(format!(
                    "year {year} is outside {MIN_YEAR}..={MAX_YEAR}"
                )));
            }
        }

        if self.from_year > self.to_year {
            return Err(PipelineError::InvalidParameters(format!(
                "from_year {} is after to_year {}",
                self.from_year, self.to_year
            )));
        }

        if let Some(unknown) = self
            .metrics
            .iter()
            .find(|name| !is_selectable_metric(name))
        {
            return Err(PipelineError::InvalidParameters(format!(
                "unknown metric '{unknown}'"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// `None` smooths monthly series only.
    pub enabled: Option<bool>,
    pub window: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl SmoothingConfig {
    pub fn enabled_for(&self, granularity: Granularity) -> bool {
        self.enabled
            .unwrap_or(granularity == Granularity::Month)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub selection: SelectionParams,
    pub smoothing: SmoothingConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
