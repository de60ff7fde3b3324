use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::aggregate::{self, AggregateSet};
use crate::combine::{self, LabeledSeries};
use crate::config::PipelineConfig;
use crate::derived;
use crate::error::{PipelineWarning, Result};
use crate::normalize;
use crate::schema;
use crate::smoothing::{self, SmoothedSeries};

/// The normalized and enriched table for one raw input. Built once, read many times.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub dataframe: DataFrame,
    pub missing_columns: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub aggregates: AggregateSet,
    /// Present when smoothing ran for this granularity.
    pub smoothed: Option<Vec<SmoothedSeries>>,
    pub long_form: DataFrame,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    /// The series that were charted: smoothed when smoothing ran, raw sums otherwise.
    pub fn display_series(&self) -> Vec<LabeledSeries> {
        display_series(&self.aggregates, self.smoothed.as_deref())
    }

    pub fn wide_form(&self) -> Result<DataFrame> {
        combine::combine_wide(&self.display_series(), &self.aggregates.counts)
    }
}

/// Validates, normalizes, and derives columns. Schema gaps and bad cells become warnings.
pub fn prepare(raw: &DataFrame) -> Result<PreparedDataset> {
    let (missing_columns, mut warnings) = schema::validate_schema(raw);

    let normalized = normalize::normalize_types(raw)?;
    warnings.extend(normalized.warnings);

    let enriched = derived::build_derived_columns(&normalized.dataframe)?;
    warnings.extend(enriched.warnings);

    debug!(
        rows = enriched.dataframe.height(),
        columns = enriched.dataframe.width(),
        warnings = warnings.len(),
        "Prepared dataset"
    );

    Ok(PreparedDataset {
        dataframe: enriched.dataframe,
        missing_columns,
        warnings,
    })
}

/// Aggregates, optionally smooths, and combines one prepared dataset for one parameter set.
pub fn aggregate_prepared(
    prepared: &PreparedDataset,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let selection = &config.selection;
    let aggregates = aggregate::aggregate(&prepared.dataframe, selection)?;

    let smoothed = if config.smoothing.enabled_for(selection.granularity) {
        let series = aggregates
            .series
            .iter()
            .map(|series| smoothing::smooth_series(series, config.smoothing.window))
            .collect::<Result<Vec<_>>>()?;
        Some(series)
    } else {
        None
    };

    let charted = display_series(&aggregates, smoothed.as_deref());
    let long_form = combine::combine_long(&charted)?;

    let mut warnings = prepared.warnings.clone();
    for warning in &aggregates.warnings {
        if !warnings.contains(warning) {
            warnings.push(warning.clone());
        }
    }

    info!(
        granularity = selection.granularity.as_str(),
        from_year = selection.from_year,
        to_year = selection.to_year,
        series = charted.len(),
        rows = long_form.height(),
        smoothed = smoothed.is_some(),
        "Pipeline run complete"
    );

    Ok(PipelineOutput {
        aggregates,
        smoothed,
        long_form,
        warnings,
    })
}

fn display_series(
    aggregates: &AggregateSet,
    smoothed: Option<&[SmoothedSeries]>,
) -> Vec<LabeledSeries> {
    match smoothed {
        Some(series) => series.iter().map(LabeledSeries::from).collect(),
        None => aggregates.series.iter().map(LabeledSeries::from).collect(),
    }
}

pub fn run_pipeline(raw: &DataFrame, config: &PipelineConfig) -> Result<PipelineOutput> {
    let prepared = prepare(raw)?;
    aggregate_prepared(&prepared, config)
}
