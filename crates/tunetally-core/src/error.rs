use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Config file error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Non-fatal data problems collected during a run. Each one is reported once per run,
/// never once per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    MissingColumn {
        column: String,
    },
    PartialDerivedColumn {
        column: String,
        missing: Vec<String>,
    },
    UnparseableCells {
        column: String,
        count: usize,
    },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::MissingColumn { column } => {
                write!(f, "column '{column}' is missing from the dataset")
            }
            PipelineWarning::PartialDerivedColumn { column, missing } => write!(
                f,
                "column '{column}' computed without {}",
                missing.join(", ")
            ),
            PipelineWarning::UnparseableCells { column, count } => {
                write!(f, "{count} value(s) in '{column}' could not be parsed")
            }
        }
    }
}
