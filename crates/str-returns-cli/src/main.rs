mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use commands::eligibility::ZonesArgs;
use commands::listing::ExtractListingArgs;
use commands::sensitivity::SensitivityArgs;
use commands::simulate::SimulateArgs;

/// Short-term-rental investment returns for Swiss apartments
#[derive(Parser)]
#[command(
    name = "strr",
    version,
    about = "Short-term-rental investment returns for Swiss apartments",
    long_about = "Estimate the annual return of a short-term-rental apartment in Switzerland \
                  with decimal precision: gross income, operating costs, interest-only \
                  mortgage, ROI, IRR, gross yield and the 20-year break-even trajectory. \
                  Listing text recognised from a screenshot can pre-fill the inputs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a return simulation
    Simulate(SimulateArgs),
    /// Print the cumulative profit vs cost trajectory, one row per year
    Breakeven(SimulateArgs),
    /// Extract price, rooms, living space, floor and renovation year from listing text
    ExtractListing(ExtractListingArgs),
    /// List the zones a residence permit allows, or check one zone
    Zones(ZonesArgs),
    /// Occupancy x nightly-rate sensitivity grid
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays machine-readable.
/// `RUST_LOG` overrides the default `warn` filter; `STRR_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let log_format = std::env::var("STRR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Breakeven(args) => commands::simulate::run_breakeven(args),
        Commands::ExtractListing(args) => commands::listing::run_extract_listing(args),
        Commands::Zones(args) => commands::eligibility::run_zones(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("strr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
