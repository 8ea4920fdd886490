//! Scan report exports — JSON round-trip and a flat signals CSV.
//!
//! Persisted reports carry a `schema_version`; unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::scan::{ScanReport, SCHEMA_VERSION};

/// Serialize a `ScanReport` to pretty JSON.
pub fn export_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

/// Deserialize a `ScanReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScanReport> {
    let report: ScanReport =
        serde_json::from_str(json).context("failed to deserialize ScanReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Flatten every signal in the report to one CSV row.
///
/// Columns: symbol, strategy_id, direction, combined_score, entry_price,
/// risk_reward_ratio, regime, anchor_price, anchor_time, families, detectors
pub fn export_signals_csv(report: &ScanReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "strategy_id",
        "direction",
        "combined_score",
        "entry_price",
        "risk_reward_ratio",
        "regime",
        "anchor_price",
        "anchor_time",
        "families",
        "detectors",
    ])?;

    for outcome in &report.outcomes {
        for signal in &outcome.signals {
            let families: Vec<&str> =
                signal.contributing_families.iter().map(String::as_str).collect();
            let detectors: Vec<&str> =
                signal.contributing_detectors.iter().map(String::as_str).collect();
            wtr.write_record([
                outcome.symbol.as_str(),
                outcome.strategy_id.as_str(),
                &format!("{:?}", signal.direction),
                &format!("{:.6}", signal.combined_score),
                &format!("{:.6}", signal.entry_price),
                &format!("{:.4}", signal.risk_reward_ratio),
                signal.regime.as_str(),
                &format!("{:.6}", signal.anchor_price),
                &signal.anchor_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                &families.join("|"),
                &detectors.join("|"),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `report.json` and `signals.csv` under `output_dir`.
///
/// Returns the paths written.
pub fn save_artifacts(report: &ScanReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let json_path = output_dir.join("report.json");
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let csv_path = output_dir.join("signals.csv");
    std::fs::write(&csv_path, export_signals_csv(report)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    Ok(vec![json_path, csv_path])
}
