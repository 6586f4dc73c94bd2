//! agri-cli: command-line runner for agricultural emissions analysis.
//!
//! Loads cleaned JSON table exports, runs the LMDI decomposition or the
//! Tapio decoupling analysis, and writes the result table as delimited text
//! or JSON. A Markdown summary is printed when results go to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use agri_core::traits::Decomposer;
use agri_core::types::GapPolicy;
use agri_decoupling::DecouplingAnalysis;
use agri_lmdi::LmdiEngine;

mod config;
mod input;
mod output;

use config::{Config, MinYear};
use output::{Format, Table};

/// Emissions decomposition and decoupling analysis.
#[derive(Parser)]
#[command(name = "agri-cli")]
#[command(version, about = "LMDI decomposition and Tapio decoupling for agricultural emissions.")]
struct Cli {
    /// First year to keep, or 'none' (overrides AGRI_MIN_YEAR).
    #[arg(long, global = true, value_parser = config::parse_min_year)]
    min_year: Option<MinYear>,

    /// Field delimiter for CSV output (overrides AGRI_DELIMITER).
    #[arg(long, global = true, value_parser = config::parse_delimiter)]
    delimiter: Option<char>,

    /// Pairing rule for non-consecutive years: adjacent or reject
    /// (overrides AGRI_GAP_POLICY).
    #[arg(long, global = true, value_parser = config::parse_gap_policy)]
    gap_policy: Option<GapPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose year-over-year emissions change into activity, structure
    /// and intensity effects.
    Lmdi(RunArgs),
    /// Print per-year structure shares and emission intensities.
    Factors(RunArgs),
    /// Classify country-years into Tapio decoupling regimes.
    Decoupling(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Input table (JSON).
    #[arg(short, long)]
    input: PathBuf,

    /// Output file. Results go to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "csv")]
    format: Format,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli).context("Failed to load configuration")?;

    info!(
        min_year = ?config.min_year,
        delimiter = %config.delimiter.escape_default(),
        gap_policy = ?config.gap_policy,
        "Starting agri-cli"
    );

    match &cli.command {
        Commands::Lmdi(args) => run_lmdi(&config, args),
        Commands::Factors(args) => run_factors(&config, args),
        Commands::Decoupling(args) => run_decoupling(&config, args),
    }
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<Config> {
    Ok(cli.apply(Config::from_env()?))
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(min_year) = self.min_year {
            config.min_year = min_year;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(gap_policy) = self.gap_policy {
            config.gap_policy = gap_policy;
        }
        config
    }
}

fn run_lmdi(config: &Config, args: &RunArgs) -> Result<()> {
    let series = input::load_lmdi(&args.input, config.min_year)?;
    let rows = LmdiEngine::with_config(config.lmdi())
        .decompose(&series)
        .context("LMDI decomposition failed")?;

    let unreconciled = rows
        .iter()
        .filter(|r| r.residual().is_some() && !r.is_reconciled(config.reconcile_tolerance))
        .count();
    info!(rows = rows.len(), unreconciled, "LMDI results ready");

    emit(&output::decomposition_table(&rows), config, args, "LMDI RESULTS")
}

fn run_factors(config: &Config, args: &RunArgs) -> Result<()> {
    let series = input::load_lmdi(&args.input, config.min_year)?;
    let rows = LmdiEngine::with_config(config.lmdi())
        .factors(&series)
        .context("Factor computation failed")?;

    emit(&output::factor_table(&rows, &series.sectors), config, args, "LMDI FACTORS")
}

fn run_decoupling(config: &Config, args: &RunArgs) -> Result<()> {
    let countries = input::load_decoupling(&args.input)?;
    let rows = DecouplingAnalysis::new(config.min_year, config.gap_policy)
        .run(&countries)
        .context("Decoupling analysis failed")?;

    emit(&output::decoupling_table(&rows), config, args, "DECOUPLING ANALYSIS")
}

/// Write `table` to the requested destination.
fn emit<T: Serialize>(table: &Table<T>, config: &Config, args: &RunArgs, title: &str) -> Result<()> {
    match &args.output {
        Some(path) => {
            table.save(path, args.format, config.delimiter)?;
            info!(path = %path.display(), "results saved");
            println!("\n--- {title} ---");
            print!("{}", table.markdown());
        }
        None => table.write(std::io::stdout().lock(), args.format, config.delimiter)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("agri-cli").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_parsed_into_typed_values() {
        let cli = parse(&[
            "lmdi", "--input", "in.json", "--min-year", "none", "--delimiter", "\\t", "--gap-policy", "reject",
        ])
        .unwrap();
        assert_eq!(cli.min_year, Some(None));
        assert_eq!(cli.delimiter, Some('\t'));
        assert_eq!(cli.gap_policy, Some(GapPolicy::Reject));

        let config = cli.apply(Config::default());
        assert_eq!(config.min_year, None);
        assert_eq!(config.delimiter, '\t');
        assert_eq!(config.gap_policy, GapPolicy::Reject);
    }

    #[test]
    fn bad_values_rejected_at_parse_time() {
        for args in [
            ["decoupling", "--input", "in.json", "--gap-policy", "interpolate"],
            ["decoupling", "--input", "in.json", "--min-year", "soon"],
            ["decoupling", "--input", "in.json", "--delimiter", ";;"],
        ] {
            let err = parse(&args).err().expect("invalid value accepted");
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn absent_overrides_keep_config() {
        let cli = parse(&["factors", "--input", "in.json"]).unwrap();
        let base = Config {
            min_year: Some(1995),
            ..Config::default()
        };
        assert_eq!(cli.apply(base.clone()), base);
    }
}
