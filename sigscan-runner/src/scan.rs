//! Parallel scan of (symbol × strategy) pairs.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sigscan_core::{Diagnostic, FinalSignal, Regime, SignalEngine, StrategyConfig};

use crate::data::Dataset;

/// Version stamp on persisted scan reports. Bump on breaking layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// One (symbol, strategy) evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub symbol: String,
    pub strategy_id: String,
    /// Fingerprint of the exact strategy config used.
    pub config_id: String,
    /// Fingerprint of the candle file evaluated.
    pub source_hash: String,
    pub regime: Regime,
    pub signals: Vec<FinalSignal>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A pair that failed to evaluate; the rest of the scan proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub symbol: String,
    pub strategy_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: u32,
    pub outcomes: Vec<ScanOutcome>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    /// Total signals across all outcomes.
    pub fn signal_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.signals.len()).sum()
    }
}

/// Evaluate every strategy against every dataset in parallel.
///
/// Results come back sorted by (symbol, strategy_id) regardless of worker
/// scheduling, so repeated scans of the same inputs serialize identically.
pub fn run_scan(
    engine: &SignalEngine,
    strategies: &[StrategyConfig],
    datasets: &[Dataset],
) -> ScanReport {
    let pairs: Vec<(&Dataset, &StrategyConfig)> = datasets
        .iter()
        .flat_map(|d| strategies.iter().map(move |s| (d, s)))
        .collect();

    let results: Vec<Result<ScanOutcome, ScanFailure>> = pairs
        .par_iter()
        .map(|(dataset, config)| match engine.evaluate(config, &dataset.window) {
            Ok(evaluation) => {
                debug!(
                    symbol = %dataset.symbol,
                    strategy = %config.strategy_id,
                    signals = evaluation.signals.len(),
                    "scan pair complete"
                );
                Ok(ScanOutcome {
                    symbol: dataset.symbol.clone(),
                    strategy_id: config.strategy_id.clone(),
                    config_id: config.config_id(),
                    source_hash: dataset.source_hash.clone(),
                    regime: evaluation.regime,
                    signals: evaluation.signals,
                    diagnostics: evaluation.diagnostics,
                })
            }
            Err(err) => {
                warn!(
                    symbol = %dataset.symbol,
                    strategy = %config.strategy_id,
                    error = %err,
                    "scan pair failed"
                );
                Err(ScanFailure {
                    symbol: dataset.symbol.clone(),
                    strategy_id: config.strategy_id.clone(),
                    error: err.to_string(),
                })
            }
        })
        .collect();

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(failure) => failures.push(failure),
        }
    }
    outcomes.sort_by(|a, b| {
        (a.symbol.as_str(), a.strategy_id.as_str())
            .cmp(&(b.symbol.as_str(), b.strategy_id.as_str()))
    });
    failures.sort_by(|a, b| {
        (a.symbol.as_str(), a.strategy_id.as_str())
            .cmp(&(b.symbol.as_str(), b.strategy_id.as_str()))
    });

    ScanReport {
        schema_version: SCHEMA_VERSION,
        outcomes,
        failures,
    }
}
