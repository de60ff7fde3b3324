use std::collections::BTreeMap;

use polars::lazy::dsl::col;
use polars::prelude::*;
use tunetally_core::combine::{
    combine_long, combine_wide, LabeledSeries, BUCKET_COLUMN, SERIES_COLUMN, VALUE_COLUMN,
};
use tunetally_core::{aggregate::aggregate, prepare, Granularity, Segment, SelectionParams, TimeBucket};

fn yearly_set() -> tunetally_core::AggregateSet {
    let raw = df![
        "Release.Date" => &["2015-01-05", "2015-07-20", "2016-02-01", "2016-03-01", "2013-06-01"],
        "Explicit.Track" => &["1", "0", "1", "0", "1"],
        "Spotify.Streams" => &["100", "50", "-1", "25", "999"],
        "TikTok.Views" => &["1,000", "2,000", "3,000", "-1", "5"],
    ]
    .expect("df");
    let prepared = prepare(&raw).expect("prepare");

    let selection = SelectionParams {
        from_year: 2015,
        to_year: 2016,
        metrics: vec!["Spotify.Streams".to_string(), "TikTok.Views".to_string()],
        granularity: Granularity::Year,
    };
    aggregate(&prepared.dataframe, &selection).expect("aggregate")
}

#[test]
fn long_form_concatenates_series_in_order() {
    let set = yearly_set();
    let labeled: Vec<LabeledSeries> = set.series.iter().map(LabeledSeries::from).collect();
    let df = combine_long(&labeled).expect("combine");

    assert_eq!(
        df.get_column_names()
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>(),
        vec![BUCKET_COLUMN, VALUE_COLUMN, SERIES_COLUMN]
    );
    assert_eq!(df.height(), 8);

    let labels = df.column(SERIES_COLUMN).unwrap().str().unwrap();
    let buckets = df.column(BUCKET_COLUMN).unwrap().str().unwrap();
    let values = df.column(VALUE_COLUMN).unwrap().f64().unwrap();

    assert_eq!(labels.get(0), Some("Spotify.Streams (Explicit)"));
    assert_eq!(buckets.get(0), Some("2015"));
    assert_eq!(values.get(0), Some(100.0));
    assert_eq!(buckets.get(1), Some("2016"));
    assert_eq!(values.get(1), Some(0.0));
    assert_eq!(labels.get(2), Some("Spotify.Streams (Non-Explicit)"));
    assert_eq!(labels.get(4), Some("TikTok.Views (Explicit)"));
    assert_eq!(values.get(5), Some(3000.0));
    assert_eq!(labels.get(7), Some("TikTok.Views (Non-Explicit)"));
    assert_eq!(values.get(7), Some(0.0));
}

#[test]
fn long_form_round_trips_through_group_by() -> PolarsResult<()> {
    let set = yearly_set();
    let labeled: Vec<LabeledSeries> = set.series.iter().map(LabeledSeries::from).collect();
    let df = combine_long(&labeled).expect("combine");

    let grouped = df
        .lazy()
        .group_by([col(SERIES_COLUMN), col(BUCKET_COLUMN)])
        .agg([col(VALUE_COLUMN).sum()])
        .collect()?;

    let labels = grouped.column(SERIES_COLUMN)?.str()?;
    let buckets = grouped.column(BUCKET_COLUMN)?.str()?;
    let values = grouped.column(VALUE_COLUMN)?.f64()?;

    let mut recovered: BTreeMap<(String, String), f64> = BTreeMap::new();
    for idx in 0..grouped.height() {
        recovered.insert(
            (
                labels.get(idx).unwrap().to_string(),
                buckets.get(idx).unwrap().to_string(),
            ),
            values.get(idx).unwrap(),
        );
    }

    let mut expected: BTreeMap<(String, String), f64> = BTreeMap::new();
    for series in &set.series {
        let label = format!("{} ({})", series.metric, series.segment.label());
        for (bucket, value) in &series.values {
            expected.insert((label.clone(), bucket.label()), *value);
        }
    }

    assert_eq!(recovered, expected);
    Ok(())
}

#[test]
fn duplicate_points_are_not_deduplicated() {
    let series = LabeledSeries {
        metric: "Spotify.Streams".to_string(),
        segment: Segment::NonExplicit,
        points: vec![
            (TimeBucket::Year(2016), Some(2.0)),
            (TimeBucket::Year(2015), Some(1.0)),
            (TimeBucket::Year(2015), Some(1.0)),
        ],
    };

    let df = combine_long(&[series]).expect("combine");
    let buckets = df.column(BUCKET_COLUMN).unwrap().str().unwrap();

    assert_eq!(df.height(), 3);
    assert_eq!(
        buckets.into_iter().collect::<Vec<_>>(),
        vec![Some("2015"), Some("2015"), Some("2016")]
    );
}

#[test]
fn missing_smoothed_values_stay_null() {
    let series = LabeledSeries {
        metric: "other".to_string(),
        segment: Segment::Explicit,
        points: vec![
            (TimeBucket::Month { year: 2015, month: 1 }, None),
            (TimeBucket::Month { year: 2015, month: 2 }, Some(4.0)),
        ],
    };

    let df = combine_long(&[series]).expect("combine");
    let values = df.column(VALUE_COLUMN).unwrap().f64().unwrap();
    let buckets = df.column(BUCKET_COLUMN).unwrap().str().unwrap();

    assert_eq!(values.get(0), None);
    assert_eq!(values.get(1), Some(4.0));
    assert_eq!(buckets.get(0), Some("2015-01"));
}

#[test]
fn wide_form_has_one_column_per_series_and_counts() {
    let set = yearly_set();
    let labeled: Vec<LabeledSeries> = set.series.iter().map(LabeledSeries::from).collect();
    let df = combine_wide(&labeled, &set.counts).expect("wide");

    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 1 + 4 + 2);

    let explicit = df
        .column("Spotify.Streams (Explicit)")
        .unwrap()
        .f64()
        .unwrap();
    assert_eq!(explicit.get(0), Some(100.0));

    let counts = df.column("count (Explicit)").unwrap().u32().unwrap();
    assert_eq!(counts.get(0), Some(1));
    assert_eq!(counts.get(1), Some(1));

    let non_explicit_counts = df.column("count (Non-Explicit)").unwrap().u32().unwrap();
    assert_eq!(non_explicit_counts.get(1), Some(1));
}
