use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("input did not contain a header row")]
    EmptyInput,

    #[error("header column {index} invalid: {message}")]
    InvalidHeader { index: usize, message: String },

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("data row {line_index} invalid: {message}")]
    DataRow { line_index: usize, message: String },

    #[error("failed to build raw table: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

impl From<csv::Error> for ParserError {
    fn from(source: csv::Error) -> Self {
        ParserError::Csv { source }
    }
}
