//! sigscan-runner — scan orchestration on top of the core engine.
//!
//! Loads candle data from CSV, resolves strategy presets and inline configs
//! from a TOML scan file, fans (symbol × strategy) pairs across a rayon pool,
//! and exports the combined report as JSON/CSV artifacts.

pub mod config;
pub mod data;
pub mod export;
pub mod presets;
pub mod scan;

pub use config::ScanConfig;
pub use data::{load_candles_csv, Dataset, LoadError};
pub use export::{export_json, export_signals_csv, import_json, save_artifacts};
pub use scan::{run_scan, ScanFailure, ScanOutcome, ScanReport, SCHEMA_VERSION};
