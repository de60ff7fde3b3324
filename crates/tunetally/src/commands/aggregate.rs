use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use polars::prelude::*;
use tracing::debug;
use tunetally_core::{run_pipeline, Granularity, PipelineConfig};

use super::load_table;

pub const CONFIG_ENV_VAR: &str = "TUNETALLY_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// One row per (bucket, series)
    #[default]
    Long,
    /// One row per bucket, one column per series
    Wide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Args, Debug, Default)]
pub struct AggregateArgs {
    /// Track table to aggregate (CSV)
    pub file: PathBuf,
    /// First release year to include
    #[arg(long)]
    pub from: Option<i32>,
    /// Last release year to include
    #[arg(long)]
    pub to: Option<i32>,
    /// Bucket size: year or month
    #[arg(long)]
    pub granularity: Option<Granularity>,
    /// Metric to aggregate; repeat for several
    #[arg(long = "metric")]
    pub metrics: Vec<String>,
    /// Force the moving average on
    #[arg(long, conflicts_with = "no_smooth")]
    pub smooth: bool,
    /// Force the moving average off
    #[arg(long)]
    pub no_smooth: bool,
    #[arg(long, value_enum, default_value_t = Layout::Long)]
    pub layout: Layout,
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
    /// TOML pipeline config; falls back to $TUNETALLY_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn handle_aggregate_command<W: Write>(args: &AggregateArgs, out: &mut W) -> Result<()> {
    let config = resolve_config(args)?;
    let raw = load_table(&args.file)?;
    let output = run_pipeline(&raw, &config)?;

    debug!(warnings = output.warnings.len(), "Pipeline finished");

    let mut table = match args.layout {
        Layout::Long => output.long_form.clone(),
        Layout::Wide => output.wide_form()?,
    };
    write_table(&mut table, args.format, out)
}

/// Config file (flag, then environment) overlaid with command-line flags.
pub fn resolve_config(args: &AggregateArgs) -> Result<PipelineConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    let mut config = match path {
        Some(path) => load_config(&path)?,
        None => PipelineConfig::default(),
    };

    let selection = &mut config.selection;
    if let Some(from) = args.from {
        selection.from_year = from;
    }
    if let Some(to) = args.to {
        selection.to_year = to;
    }
    if let Some(granularity) = args.granularity {
        selection.granularity = granularity;
    }
    if !args.metrics.is_empty() {
        selection.metrics = args.metrics.clone();
    }

    if args.smooth {
        config.smoothing.enabled = Some(true);
    } else if args.no_smooth {
        config.smoothing.enabled = Some(false);
    }

    Ok(config)
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    debug!(path = %path.display(), "Loading pipeline config");
    PipelineConfig::load(path).with_context(|| format!("invalid config {}", path.display()))
}

fn write_table<W: Write>(df: &mut DataFrame, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Csv => CsvWriter::new(out).include_header(true).finish(df)?,
        OutputFormat::Json => JsonWriter::new(out)
            .with_json_format(JsonFormat::Json)
            .finish(df)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sample_path;

    fn yearly_args() -> AggregateArgs {
        AggregateArgs {
            file: sample_path(),
            granularity: Some(Granularity::Year),
            from: Some(2019),
            to: Some(2024),
            metrics: vec!["Spotify.Streams".to_string()],
            ..AggregateArgs::default()
        }
    }

    #[test]
    fn flags_override_defaults() {
        let args = AggregateArgs {
            no_smooth: true,
            config: Some(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/tests/data/yearly.toml"
            ))),
            ..yearly_args()
        };
        let config = resolve_config(&args).expect("config");

        assert_eq!(config.selection.from_year, 2019);
        assert_eq!(config.selection.to_year, 2024);
        assert_eq!(config.selection.metrics, vec!["Spotify.Streams".to_string()]);
        assert_eq!(config.smoothing.enabled, Some(false));
        assert_eq!(config.smoothing.window, 3);
    }

    #[test]
    fn missing_config_file_fails() {
        let args = AggregateArgs {
            config: Some(PathBuf::from("no/such/config.toml")),
            ..yearly_args()
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"), "{err}");
    }

    #[test]
    fn long_csv_output() {
        let mut out = Vec::new();
        handle_aggregate_command(&yearly_args(), &mut out).expect("aggregate");

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("bucket,value,series"));

        let rows: Vec<(String, f64, String)> = lines
            .map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                (
                    fields[0].to_string(),
                    fields[1].parse().unwrap(),
                    fields[2].to_string(),
                )
            })
            .collect();
        // 6 years x 2 segments
        assert_eq!(rows.len(), 12);
        assert!(rows.contains(&(
            "2024".to_string(),
            323_703_884.0,
            "Spotify.Streams (Explicit)".to_string()
        )));
        assert!(rows.contains(&(
            "2019".to_string(),
            500.0,
            "Spotify.Streams (Non-Explicit)".to_string()
        )));
    }

    #[test]
    fn wide_json_output() {
        let args = AggregateArgs {
            layout: Layout::Wide,
            format: OutputFormat::Json,
            ..yearly_args()
        };
        let mut out = Vec::new();
        handle_aggregate_command(&args, &mut out).expect("aggregate");

        let rows: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let rows = rows.as_array().expect("array of rows");
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5]["bucket"], "2024");
        assert_eq!(rows[5]["Spotify.Streams (Non-Explicit)"], 390470936.0);
        assert_eq!(rows[5]["count (Explicit)"], 1);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let args = AggregateArgs {
            metrics: vec!["Myspace.Plays".to_string()],
            ..yearly_args()
        };
        let mut out = Vec::new();
        let err = handle_aggregate_command(&args, &mut out).unwrap_err();
        assert!(err.to_string().contains("unknown metric"), "{err}");
    }
}
