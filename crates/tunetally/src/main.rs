use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::aggregate::{handle_aggregate_command, AggregateArgs};
use commands::validate::{handle_validate_command, ValidateArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track engagement aggregation CLI", long_about = None)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a track table against the expected schema
    Validate(ValidateArgs),
    /// Aggregate a track table and write the combined series to stdout
    Aggregate(AggregateArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Validate(args) => {
            handle_validate_command(&args, &mut out)?;
            info!(file = %args.file.display(), "Validation finished");
        }
        Command::Aggregate(args) => {
            handle_aggregate_command(&args, &mut out)?;
            info!(file = %args.file.display(), "Aggregation finished");
        }
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();
}
