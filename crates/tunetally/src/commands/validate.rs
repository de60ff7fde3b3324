use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::Table;
use serde::Serialize;
use tunetally_core::schema::EXPECTED_COLUMNS;
use tunetally_core::{prepare, PipelineWarning};

use super::load_table;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Track table to check (CSV)
    pub file: PathBuf,
    /// Print a JSON summary instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ValidationSummary<'a> {
    rows: usize,
    missing_columns: &'a [String],
    warnings: &'a [PipelineWarning],
}

/// Reports schema gaps and data warnings. Gaps never fail the command.
pub fn handle_validate_command<W: Write>(args: &ValidateArgs, out: &mut W) -> Result<()> {
    let raw = load_table(&args.file)?;
    let prepared = prepare(&raw)?;

    if args.json {
        let summary = ValidationSummary {
            rows: raw.height(),
            missing_columns: &prepared.missing_columns,
            warnings: &prepared.warnings,
        };
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
        return Ok(());
    }

    let mut columns = Table::new();
    columns.set_header(vec!["Column", "Status"]);
    for name in EXPECTED_COLUMNS {
        let status = if prepared.missing_columns.iter().any(|missing| missing == name) {
            "missing"
        } else {
            "present"
        };
        columns.add_row(vec![name, status]);
    }
    writeln!(out, "{} rows", raw.height())?;
    writeln!(out, "{columns}")?;

    if !prepared.warnings.is_empty() {
        let mut warnings = Table::new();
        warnings.set_header(vec!["Warning"]);
        for warning in &prepared.warnings {
            warnings.add_row(vec![warning.to_string()]);
        }
        writeln!(out, "{warnings}")?;
    }
    Ok(())
}
