use std::collections::HashSet;

use csv::ReaderBuilder;
use polars::prelude::*;

use crate::errors::ParserError;

const UTF8_BOM: char = '\u{feff}';

/// Reads CSV text into a raw table where every column is a nullable string.
///
/// Cells are trimmed and empty cells become null. Rows shorter than the header are
/// padded with nulls; rows longer than the header are rejected.
pub fn parse_track_table(content: &str) -> Result<DataFrame, ParserError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(ParserError::EmptyInput);
    }
    let names = parse_header(&header)?;

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let line_index = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(row_index + 2);

        if record.len() > names.len() {
            return Err(ParserError::DataRow {
                line_index,
                message: format!(
                    "expected at most {} fields, found {}",
                    names.len(),
                    record.len()
                ),
            });
        }

        for (idx, values) in columns.iter_mut().enumerate() {
            values.push(clean_cell(record.get(idx)));
        }
    }

    let mut cols: Vec<Column> = Vec::with_capacity(names.len());
    for (name, values) in names.iter().zip(columns.iter()) {
        let utf8: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
        cols.push(Series::new(name.as_str().into(), utf8).into());
    }

    Ok(DataFrame::new(cols)?)
}

fn parse_header(header: &csv::StringRecord) -> Result<Vec<String>, ParserError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, raw) in header.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ParserError::InvalidHeader {
                index,
                message: "column name is empty".to_string(),
            });
        }
        if !seen.insert(name.to_string()) {
            return Err(ParserError::InvalidHeader {
                index,
                message: format!("duplicate column '{name}'"),
            });
        }
        names.push(name.to_string());
    }

    Ok(names)
}

fn clean_cell(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
