use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use crate::config::SelectionParams;
use crate::error::{PipelineWarning, Result};
use crate::normalize::days_to_date;
use crate::schema::{has_column, EXPLICIT, RELEASE_DATE, YEAR};
use crate::types::{Granularity, Segment, TimeBucket};

/// Sum of one metric per bucket for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSeries {
    pub metric: String,
    pub segment: Segment,
    pub values: BTreeMap<TimeBucket, f64>,
}

/// Rows per bucket for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSeries {
    pub segment: Segment,
    pub counts: BTreeMap<TimeBucket, u32>,
}

impl CountSeries {
    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Scales each count against the segment maximum, for line thickness and the like.
    pub fn weights(&self, max_width: f64) -> BTreeMap<TimeBucket, f64> {
        let max = self.max_count();
        self.counts
            .iter()
            .map(|(bucket, count)| {
                let weight = if max == 0 {
                    0.0
                } else {
                    f64::from(*count) / f64::from(max) * max_width
                };
                (*bucket, weight)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AggregateSet {
    pub granularity: Granularity,
    /// One entry per (metric, segment); metrics in selection order, explicit first.
    pub series: Vec<AggregateSeries>,
    pub counts: Vec<CountSeries>,
    pub warnings: Vec<PipelineWarning>,
}

impl AggregateSet {
    pub fn get(&self, metric: &str, segment: Segment) -> Option<&AggregateSeries> {
        self.series
            .iter()
            .find(|series| series.metric == metric && series.segment == segment)
    }

    pub fn counts_for(&self, segment: Segment) -> Option<&CountSeries> {
        self.counts.iter().find(|counts| counts.segment == segment)
    }
}

/// Keeps rows whose `Year` lies in the inclusive range. Rows without a year are dropped.
pub fn filter_year_range(df: &DataFrame, from_year: i32, to_year: i32) -> Result<DataFrame> {
    if !has_column(df, YEAR) {
        return Ok(df.clear());
    }

    let years = df.column(YEAR)?.cast(&DataType::Int32)?;
    let years = years.i32()?;
    let mask = years.gt_eq(from_year) & years.lt_eq(to_year);
    Ok(df.filter(&mask)?)
}

/// Splits rows by explicit flag, buckets them by release date, and sums each selected
/// metric per bucket with nulls skipped. Repeated metric names are aggregated once.
///
/// Year granularity yields every year of the range, empty years as 0. Month granularity
/// yields only months that have at least one row.
pub fn aggregate(prepared: &DataFrame, params: &SelectionParams) -> Result<AggregateSet> {
    params.validate()?;

    let mut warnings = Vec::new();
    let mut metrics: Vec<&str> = Vec::with_capacity(params.metrics.len());
    for name in &params.metrics {
        if metrics.contains(&name.as_str()) {
            continue;
        }
        if has_column(prepared, name) {
            metrics.push(name.as_str());
        } else {
            let warning = PipelineWarning::MissingColumn {
                column: name.clone(),
            };
            if !warnings.contains(&warning) {
                debug!(column = name.as_str(), "Selected metric missing, skipping");
                warnings.push(warning);
            }
        }
    }

    let in_range = filter_year_range(prepared, params.from_year, params.to_year)?;
    let buckets = row_buckets(&in_range, params.granularity)?;
    let segments = row_segments(&in_range)?;

    let seed: Vec<TimeBucket> = match params.granularity {
        Granularity::Year => (params.from_year..=params.to_year)
            .map(TimeBucket::Year)
            .collect(),
        Granularity::Month => Vec::new(),
    };

    let mut counts_by_segment: BTreeMap<Segment, BTreeMap<TimeBucket, u32>> = Segment::ALL
        .iter()
        .map(|segment| (*segment, seed.iter().map(|bucket| (*bucket, 0)).collect()))
        .collect();

    for (bucket, segment) in buckets.iter().zip(segments.iter()) {
        if let Some(bucket) = bucket {
            *counts_by_segment
                .entry(*segment)
                .or_default()
                .entry(*bucket)
                .or_insert(0) += 1;
        }
    }

    let mut series = Vec::with_capacity(metrics.len() * Segment::ALL.len());
    for metric in &metrics {
        let values = in_range.column(metric)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut sums: BTreeMap<Segment, BTreeMap<TimeBucket, f64>> = Segment::ALL
            .iter()
            .map(|segment| (*segment, seed.iter().map(|bucket| (*bucket, 0.0)).collect()))
            .collect();

        for (idx, (bucket, segment)) in buckets.iter().zip(segments.iter()).enumerate() {
            let Some(bucket) = bucket else {
                continue;
            };
            let total = sums
                .entry(*segment)
                .or_default()
                .entry(*bucket)
                .or_insert(0.0);
            if let Some(value) = values.get(idx).filter(|v| v.is_finite()) {
                *total += value;
            }
        }

        for segment in Segment::ALL {
            series.push(AggregateSeries {
                metric: metric.to_string(),
                segment,
                values: sums.remove(&segment).unwrap_or_default(),
            });
        }
    }

    let counts: Vec<CountSeries> = Segment::ALL
        .iter()
        .map(|segment| CountSeries {
            segment: *segment,
            counts: counts_by_segment.remove(segment).unwrap_or_default(),
        })
        .collect();

    debug!(
        granularity = params.granularity.as_str(),
        rows_in_range = in_range.height(),
        series = series.len(),
        "Aggregated dataset"
    );

    Ok(AggregateSet {
        granularity: params.granularity,
        series,
        counts,
        warnings,
    })
}

fn row_buckets(df: &DataFrame, granularity: Granularity) -> Result<Vec<Option<TimeBucket>>> {
    match granularity {
        Granularity::Year => {
            if !has_column(df, YEAR) {
                return Ok(vec![None; df.height()]);
            }
            let years = df.column(YEAR)?.cast(&DataType::Int32)?;
            Ok(years
                .i32()?
                .into_iter()
                .map(|year| year.map(TimeBucket::Year))
                .collect())
        }
        Granularity::Month => {
            if !has_column(df, RELEASE_DATE) {
                return Ok(vec![None; df.height()]);
            }
            let days = df.column(RELEASE_DATE)?.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|day| {
                    day.and_then(days_to_date)
                        .map(|date| granularity.bucket_for(date))
                })
                .collect())
        }
    }
}

fn row_segments(df: &DataFrame) -> Result<Vec<Segment>> {
    if !has_column(df, EXPLICIT) {
        return Ok(vec![Segment::NonExplicit; df.height()]);
    }
    let flags = df.column(EXPLICIT)?.cast(&DataType::Int32)?;
    Ok(flags
        .i32()?
        .into_iter()
        .map(|flag| Segment::from_flag(flag.unwrap_or(0)))
        .collect())
}
