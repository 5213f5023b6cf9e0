//! `tally`: forecast resource levels of a conversion economy.
//!
//! # Commands
//!
//! - `tally run` builds an economy from a configuration (or from poker
//!   tales rules), simulates it to a horizon and prints the balances. With
//!   `--runs N` the economy is reset and simulated again `N` times, one
//!   report per run.
//! - `tally generate` expands poker tales rules into a full economy
//!   configuration.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`); reports go
//! to stdout.

mod error;
mod report;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tally_core::{Economy, EconomyConfig};
use tally_rules::PokerTalesRules;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::report::{ConfigFormat, RunFormat, RunReport};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Conversion economy simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an economy and print the resulting balances
    Run(RunArgs),

    /// Print the economy configuration generated from poker tales rules
    Generate(GenerateArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Economy configuration file (YAML or JSON)
    #[arg(long, conflicts_with = "rules", required_unless_present = "rules")]
    config: Option<PathBuf>,

    /// Poker tales rules file to generate the economy from
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Simulated seconds per run
    #[arg(long, default_value = "1000000")]
    horizon: u64,

    /// Number of runs, resetting the economy in between
    #[arg(long, default_value = "1")]
    runs: u64,

    /// Seed for reproducible outcome draws
    #[arg(long)]
    seed: Option<u64>,

    /// Abort when immediate conversions run this many passes without settling
    #[arg(long)]
    max_drain_passes: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: RunFormat,
}

#[derive(Args)]
struct GenerateArgs {
    /// Poker tales rules file
    #[arg(long)]
    rules: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "yaml")]
    format: ConfigFormat,
}

/// Entry point for the `tally` binary.
///
/// # Errors
///
/// Returns an error if loading, generation or simulation fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(&args),
        Commands::Generate(args) => generate(&args),
    };

    if let Err(err) = result {
        error!(error = %err, "tally failed");
        return Err(err.into());
    }
    Ok(())
}

fn run(args: &RunArgs) -> Result<(), CliError> {
    let config = load_economy(args.config.as_deref(), args.rules.as_deref())?;

    let economy = match args.seed {
        Some(seed) => Economy::seeded(&config, seed)?,
        None => Economy::new(&config)?,
    };
    let mut economy = match args.max_drain_passes {
        Some(passes) => economy.with_max_drain_passes(passes),
        None => economy,
    };
    info!(
        items = economy.ledger().len(),
        immediate = economy.conversions().len(),
        periodic = economy.periodic().len(),
        horizon = args.horizon,
        runs = args.runs,
        "Economy built"
    );

    for run in 1..=args.runs {
        economy.simulate(args.horizon)?;
        let report = RunReport::capture(run, &economy);
        println!("{}", report.render(args.format)?);
        economy.reset();
    }
    Ok(())
}

fn generate(args: &GenerateArgs) -> Result<(), CliError> {
    let config = PokerTalesRules::from_file(&args.rules)?.generate()?;
    let text = match args.format {
        ConfigFormat::Yaml => config.to_yaml()?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };
    println!("{text}");
    Ok(())
}

/// Load an economy configuration directly or generate it from rules.
fn load_economy(config: Option<&Path>, rules: Option<&Path>) -> Result<EconomyConfig, CliError> {
    match (config, rules) {
        (Some(path), _) => {
            let config = EconomyConfig::from_file(path)?;
            info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        (None, Some(path)) => {
            let config = PokerTalesRules::from_file(path)?.generate()?;
            info!(path = %path.display(), "Configuration generated from rules");
            Ok(config)
        }
        (None, None) => Err(CliError::MissingInput),
    }
}
