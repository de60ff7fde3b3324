use std::collections::BTreeMap;

use crate::aggregate::AggregateSeries;
use crate::error::{PipelineError, Result};
use crate::types::{Segment, TimeBucket};

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSeries {
    pub metric: String,
    pub segment: Segment,
    pub values: BTreeMap<TimeBucket, Option<f64>>,
}

/// Centered moving average over positions. For width `w`, position `i` averages
/// `i - w/2 ..= i + (w - 1)/2`, so width 6 takes three before and two after.
///
/// A position yields `None` unless all `w` values of its window exist and are present.
pub fn rolling_centered_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let before = window / 2;
    let after = window.saturating_sub(1) / 2;

    (0..values.len())
        .map(|idx| {
            if window == 0 || idx < before || idx + after >= values.len() {
                return None;
            }
            let slice = &values[idx - before..=idx + after];
            let mut sum = 0.0;
            for value in slice {
                sum += (*value)?;
            }
            Some(sum / window as f64)
        })
        .collect()
}

pub fn smooth_series(series: &AggregateSeries, window: usize) -> Result<SmoothedSeries> {
    if window == 0 {
        return Err(PipelineError::InvalidParameters(
            "smoothing window must be at least 1".to_string(),
        ));
    }

    let buckets: Vec<TimeBucket> = series.values.keys().copied().collect();
    let raw: Vec<Option<f64>> = series.values.values().map(|v| Some(*v)).collect();
    let smoothed = rolling_centered_mean(&raw, window);

    Ok(SmoothedSeries {
        metric: series.metric.clone(),
        segment: series.segment,
        values: buckets.into_iter().zip(smoothed).collect(),
    })
}
