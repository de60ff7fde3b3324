use polars::prelude::*;
use tracing::warn;

use crate::error::{PipelineWarning, Result};
use crate::normalize::parse_count;
use crate::schema::{has_column, EXPLICIT, OTHER, OTHER_PLATFORM_COLUMNS};
use crate::types::StageOutput;

/// Adds the `other` column and coerces `Explicit.Track` to 0/1.
pub fn build_derived_columns(normalized: &DataFrame) -> Result<StageOutput> {
    let mut output = normalized.clone();
    let mut warnings = Vec::new();

    let (other, missing) = sum_other_platforms(normalized)?;
    if !missing.is_empty() {
        warn!(
            column = OTHER,
            missing = ?missing,
            "Derived column computed from a partial set of platforms"
        );
        warnings.push(PipelineWarning::PartialDerivedColumn {
            column: OTHER.to_string(),
            missing,
        });
    }
    output.with_column(other)?;

    let (flags, failures) = explicit_flags(normalized)?;
    if failures > 0 {
        warn!(
            column = EXPLICIT,
            count = failures,
            "Unparseable explicit flags treated as non-explicit"
        );
        warnings.push(PipelineWarning::UnparseableCells {
            column: EXPLICIT.to_string(),
            count: failures,
        });
    }
    output.with_column(Series::new(EXPLICIT.into(), flags))?;

    Ok(StageOutput {
        dataframe: output,
        warnings,
    })
}

/// Row-wise sum of the present minor-platform columns, nulls skipped. Returns the series
/// and the names of the contributing columns that were absent.
fn sum_other_platforms(df: &DataFrame) -> Result<(Series, Vec<String>)> {
    let mut totals = vec![0.0f64; df.height()];
    let mut missing = Vec::new();

    for name in OTHER_PLATFORM_COLUMNS {
        if !has_column(df, name) {
            missing.push(name.to_string());
            continue;
        }

        let values = df.column(name)?.cast(&DataType::Float64)?;
        for (total, value) in totals.iter_mut().zip(values.f64()?.into_iter()) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *total += v;
            }
        }
    }

    Ok((Series::new(OTHER.into(), totals), missing))
}

/// Coerces the explicit flag to 0/1. Missing cells become 0, as does the whole column when
/// it is absent; unrecognised text is counted and also becomes 0.
fn explicit_flags(df: &DataFrame) -> Result<(Vec<i32>, usize)> {
    if !has_column(df, EXPLICIT) {
        return Ok((vec![0; df.height()], 0));
    }

    let column = df.column(EXPLICIT)?;
    let mut failures = 0usize;

    let flags = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|cell| match cell.map(str::trim) {
                None | Some("") => 0,
                Some(text) => match parse_flag(text) {
                    Some(flag) => flag,
                    None => {
                        failures += 1;
                        0
                    }
                },
            })
            .collect(),
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|value| i32::from(value.unwrap_or(false)))
            .collect(),
        _ => column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| match value {
                Some(v) if v != 0.0 && !v.is_nan() => 1,
                _ => 0,
            })
            .collect(),
    };

    Ok((flags, failures))
}

fn parse_flag(text: &str) -> Option<i32> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Some(1),
        "false" | "no" | "n" => Some(0),
        _ => parse_count(text).map(|value| i32::from(value != 0.0)),
    }
}
