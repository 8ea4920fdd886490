//! sigscan CLI — run signal scans and inspect the detector registry.
//!
//! Commands:
//! - `scan` — load candle CSVs, run every configured strategy, write artifacts
//! - `detectors` — list the built-in detectors and their families

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sigscan_core::{DetectorRegistry, SignalEngine};
use sigscan_runner::presets::PRESET_NAMES;
use sigscan_runner::{load_candles_csv, run_scan, save_artifacts, ScanConfig};

#[derive(Parser)]
#[command(name = "sigscan", about = "sigscan — candle-window signal scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the strategies in a scan config against its symbols.
    Scan {
        /// Path to a TOML scan config.
        #[arg(long, default_value = "scan.toml")]
        config: PathBuf,

        /// Output directory for report.json and signals.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// List built-in detectors and strategy presets.
    Detectors,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { config, output_dir } => run_scan_command(&config, &output_dir),
        Commands::Detectors => list_detectors(),
    }
}

fn run_scan_command(config_path: &PathBuf, output_dir: &PathBuf) -> Result<()> {
    let config = ScanConfig::load(config_path)?;
    let strategies = config.resolved_strategies()?;
    info!(
        symbols = config.symbols.len(),
        strategies = strategies.len(),
        "starting scan"
    );

    let mut datasets = Vec::new();
    for symbol in &config.symbols {
        let path = config.candle_path(symbol);
        let dataset = load_candles_csv(symbol, &path, Some(config.window_candles))
            .with_context(|| format!("failed to load candles for {symbol}"))?;
        info!(symbol = %symbol, candles = dataset.window.len(), "loaded");
        datasets.push(dataset);
    }

    let engine = SignalEngine::new(Arc::new(DetectorRegistry::with_builtins()))
        .with_conflict_policy(config.conflict_policy)
        .with_zone_tolerance(config.zone_tolerance);
    let report = run_scan(&engine, &strategies, &datasets);

    for failure in &report.failures {
        eprintln!(
            "FAILED {} / {}: {}",
            failure.symbol, failure.strategy_id, failure.error
        );
    }

    let paths = save_artifacts(&report, output_dir)?;
    println!(
        "scan complete: {} signals across {} pairs ({} failed)",
        report.signal_count(),
        report.outcomes.len(),
        report.failures.len()
    );
    for path in paths {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn list_detectors() -> Result<()> {
    let registry = DetectorRegistry::with_builtins();
    println!("detectors:");
    for (id, family) in registry.list_with_families() {
        println!("  {id:<28} {family}");
    }
    println!("\npresets:");
    for name in PRESET_NAMES {
        println!("  {name}");
    }
    Ok(())
}
