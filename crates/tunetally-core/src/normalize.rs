use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::{PipelineWarning, Result};
use crate::schema::{
    has_column, METRIC_COLUMNS, RELEASE_DATE, SENTINELED_COLUMNS, SENTINEL_VALUE, YEAR,
};
use crate::types::StageOutput;

/// Days between 0001-01-01 and 1970-01-01, the offset polars `Date` values are stored from.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];
static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses the release date forms seen across dataset revisions. Returns `None` for anything
/// unrecognised.
pub fn parse_release_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    // Year-month only, e.g. "2015-01".
    if trimmed.len() == 7 && trimmed.as_bytes()[4] == b'-' {
        return NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok();
    }

    None
}

/// Parses a count cell. Thousands separators are accepted; non-numeric and non-finite
/// values give `None`.
pub fn parse_count(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Parses `Release.Date`, derives `Year`, and coerces every present metric column to
/// Float64 with sentinels nulled. Each step skips when its column is absent.
pub fn normalize_types(raw: &DataFrame) -> Result<StageOutput> {
    let mut output = raw.clone();
    let mut warnings = Vec::new();

    if has_column(raw, RELEASE_DATE) {
        let (dates, failures) = coerce_dates(raw.column(RELEASE_DATE)?)?;
        if failures > 0 {
            warnings.push(unparseable(RELEASE_DATE, failures));
        }

        let years: Vec<Option<i32>> = dates
            .iter()
            .map(|date| date.map(|value| value.year()))
            .collect();
        let days: Vec<Option<i32>> = dates
            .iter()
            .map(|date| date.map(date_to_days))
            .collect();

        let date_series = Series::new(RELEASE_DATE.into(), days).cast(&DataType::Date)?;
        output.with_column(date_series)?;
        output.with_column(Series::new(YEAR.into(), years))?;
    } else {
        let years: Vec<Option<i32>> = vec![None; raw.height()];
        output.with_column(Series::new(YEAR.into(), years))?;
    }

    for name in METRIC_COLUMNS {
        if !has_column(raw, name) {
            continue;
        }

        let sentineled = SENTINELED_COLUMNS.contains(&name);
        let coerced = coerce_metric(raw.column(name)?, sentineled)?;

        if coerced.failures > 0 {
            warnings.push(unparseable(name, coerced.failures));
        }
        if coerced.sentinels > 0 {
            debug!(
                column = name,
                count = coerced.sentinels,
                "Replaced sentinel values with nulls"
            );
        }

        output.with_column(Series::new(name.into(), coerced.values))?;
    }

    Ok(StageOutput {
        dataframe: output,
        warnings,
    })
}

struct CoercedMetric {
    values: Vec<Option<f64>>,
    failures: usize,
    sentinels: usize,
}

fn coerce_metric(column: &Column, sentineled: bool) -> Result<CoercedMetric> {
    let mut failures = 0usize;
    let mut sentinels = 0usize;

    let parsed: Vec<Option<f64>> = if column.dtype() == &DataType::String {
        column
            .str()?
            .into_iter()
            .map(|cell| match cell {
                None => None,
                Some(text) if text.trim().is_empty() => None,
                Some(text) => {
                    let value = parse_count(text);
                    if value.is_none() {
                        failures += 1;
                    }
                    value
                }
            })
            .collect()
    } else {
        column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect()
    };

    let values = parsed
        .into_iter()
        .map(|value| match value {
            Some(v) if sentineled && v == SENTINEL_VALUE => {
                sentinels += 1;
                None
            }
            other => other,
        })
        .collect();

    Ok(CoercedMetric {
        values,
        failures,
        sentinels,
    })
}

fn coerce_dates(column: &Column) -> Result<(Vec<Option<NaiveDate>>, usize)> {
    let mut failures = 0usize;

    let dates = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|cell| match cell {
                None => None,
                Some(text) if text.trim().is_empty() => None,
                Some(text) => {
                    let date = parse_release_date(text);
                    if date.is_none() {
                        failures += 1;
                    }
                    date
                }
            })
            .collect(),
        _ => column
            .cast(&DataType::Date)?
            .cast(&DataType::Int32)?
            .i32()?
            .into_iter()
            .map(|days| days.and_then(days_to_date))
            .collect(),
    };

    Ok((dates, failures))
}

fn unparseable(column: &str, count: usize) -> PipelineWarning {
    warn!(column, count, "Unparseable values replaced with nulls");
    PipelineWarning::UnparseableCells {
        column: column.to_string(),
        count,
    }
}
