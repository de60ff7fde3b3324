use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::PipelineWarning;

/// A dataframe produced by one pipeline stage plus the gaps it ran into.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub dataframe: DataFrame,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    #[default]
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::Month => "month",
        }
    }

    pub fn bucket_for(&self, date: NaiveDate) -> TimeBucket {
        match self {
            Granularity::Year => TimeBucket::Year(date.year()),
            Granularity::Month => TimeBucket::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "year" | "yearly" | "y" => Ok(Granularity::Year),
            "month" | "monthly" | "m" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

/// Grouping key derived from a release date. Variant order keeps buckets of one
/// granularity in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeBucket {
    Year(i32),
    Month { year: i32, month: u32 },
}

impl TimeBucket {
    pub fn label(&self) -> String {
        match self {
            TimeBucket::Year(year) => format!("{year:04}"),
            TimeBucket::Month { year, month } => format!("{year:04}-{month:02}"),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Explicit,
    NonExplicit,
}

impl Segment {
    /// Explicit first, matching the order series are emitted in.
    pub const ALL: [Segment; 2] = [Segment::Explicit, Segment::NonExplicit];

    pub fn from_flag(flag: i32) -> Self {
        if flag == 1 {
            Segment::Explicit
        } else {
            Segment::NonExplicit
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Explicit => "Explicit",
            Segment::NonExplicit => "Non-Explicit",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Chart label for one (metric, segment) series, e.g. `Spotify.Streams (Explicit)`.
pub fn series_label(metric: &str, segment: Segment) -> String {
    format!("{metric} ({})", segment.label())
}
