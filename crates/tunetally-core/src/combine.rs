use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::aggregate::{AggregateSeries, CountSeries};
use crate::error::Result;
use crate::smoothing::SmoothedSeries;
use crate::types::{series_label, Segment, TimeBucket};

pub const BUCKET_COLUMN: &str = "bucket";
pub const VALUE_COLUMN: &str = "value";
pub const SERIES_COLUMN: &str = "series";

/// One chartable series, raw or smoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub metric: String,
    pub segment: Segment,
    pub points: Vec<(TimeBucket, Option<f64>)>,
}

impl LabeledSeries {
    pub fn label(&self) -> String {
        series_label(&self.metric, self.segment)
    }
}

impl From<&AggregateSeries> for LabeledSeries {
    fn from(series: &AggregateSeries) -> Self {
        Self {
            metric: series.metric.clone(),
            segment: series.segment,
            points: series
                .values
                .iter()
                .map(|(bucket, value)| (*bucket, Some(*value)))
                .collect(),
        }
    }
}

impl From<&SmoothedSeries> for LabeledSeries {
    fn from(series: &SmoothedSeries) -> Self {
        Self {
            metric: series.metric.clone(),
            segment: series.segment,
            points: series
                .values
                .iter()
                .map(|(bucket, value)| (*bucket, *value))
                .collect(),
        }
    }
}

/// Stacks the series into `bucket | value | series` rows. Series keep their input order and
/// each is sorted by bucket; duplicate (series, bucket) rows are kept as given.
pub fn combine_long(series: &[LabeledSeries]) -> Result<DataFrame> {
    let total: usize = series.iter().map(|s| s.points.len()).sum();
    let mut buckets: Vec<String> = Vec::with_capacity(total);
    let mut values: Vec<Option<f64>> = Vec::with_capacity(total);
    let mut labels: Vec<String> = Vec::with_capacity(total);

    for entry in series {
        let label = entry.label();
        let mut points = entry.points.clone();
        points.sort_by_key(|(bucket, _)| *bucket);

        for (bucket, value) in points {
            buckets.push(bucket.label());
            values.push(value);
            labels.push(label.clone());
        }
    }

    let df = df![
        BUCKET_COLUMN => buckets,
        VALUE_COLUMN => values,
        SERIES_COLUMN => labels,
    ]?;
    Ok(df)
}

/// One row per bucket, one column per series label plus `count (<segment>)` columns.
/// Cells are null where a series has no point for the bucket.
pub fn combine_wide(series: &[LabeledSeries], counts: &[CountSeries]) -> Result<DataFrame> {
    let mut domain: BTreeSet<TimeBucket> = BTreeSet::new();
    for entry in series {
        domain.extend(entry.points.iter().map(|(bucket, _)| *bucket));
    }
    for entry in counts {
        domain.extend(entry.counts.keys().copied());
    }
    let domain: Vec<TimeBucket> = domain.into_iter().collect();

    let mut columns: Vec<Column> = Vec::with_capacity(series.len() + counts.len() + 1);
    let labels: Vec<String> = domain.iter().map(TimeBucket::label).collect();
    columns.push(Series::new(BUCKET_COLUMN.into(), labels).into());

    for entry in series {
        let lookup: BTreeMap<TimeBucket, Option<f64>> = entry.points.iter().copied().collect();
        let values: Vec<Option<f64>> = domain
            .iter()
            .map(|bucket| lookup.get(bucket).copied().flatten())
            .collect();
        columns.push(Series::new(entry.label().into(), values).into());
    }

    for entry in counts {
        let values: Vec<Option<u32>> = domain
            .iter()
            .map(|bucket| entry.counts.get(bucket).copied())
            .collect();
        let name = format!("count ({})", entry.segment.label());
        columns.push(Series::new(name.into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}
