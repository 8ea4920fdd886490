//! Scan configuration file (TOML).
//!
//! A scan file names the symbols to load, how much history to keep, and the
//! strategies to run — either by preset name or as full inline strategy
//! tables. Example:
//!
//! ```toml
//! data_dir = "data"
//! symbols = ["BTCUSD", "ETHUSD"]
//! window_candles = 500
//! presets = ["structure_confluence"]
//!
//! [[strategies]]
//! strategy_id = "my_breakouts"
//! detectors = ["sr_break_close"]
//! min_score = 0.8
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use sigscan_core::{ConflictPolicy, StrategyConfig, ZoneTolerance};

use crate::presets::preset;

fn default_window_candles() -> usize {
    500
}

fn default_zone_tolerance() -> ZoneTolerance {
    ZoneTolerance::default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory holding `{symbol}.csv` candle files.
    pub data_dir: PathBuf,

    pub symbols: Vec<String>,

    /// Most recent candles kept per symbol.
    #[serde(default = "default_window_candles")]
    pub window_candles: usize,

    /// How the engine treats near-tied opposing-direction conflicts.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Zone overlap tolerance for confluence clustering.
    #[serde(default = "default_zone_tolerance")]
    pub zone_tolerance: ZoneTolerance,

    /// Preset strategy names to include.
    #[serde(default)]
    pub presets: Vec<String>,

    /// Inline strategy definitions.
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scan config {}", path.display()))?;
        let config: ScanConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse scan config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            bail!("scan config lists no symbols");
        }
        if self.presets.is_empty() && self.strategies.is_empty() {
            bail!("scan config lists no presets and no inline strategies");
        }
        if self.window_candles == 0 {
            bail!("window_candles must be positive");
        }
        Ok(())
    }

    /// Candle file path for a symbol.
    pub fn candle_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    /// Presets plus inline strategies, validated, with unique strategy ids.
    pub fn resolved_strategies(&self) -> Result<Vec<StrategyConfig>> {
        let mut out = Vec::new();
        for name in &self.presets {
            let config =
                preset(name).with_context(|| format!("unknown preset `{name}`"))?;
            out.push(config);
        }
        out.extend(self.strategies.iter().cloned());

        let mut seen = std::collections::BTreeSet::new();
        for config in &out {
            config
                .validate()
                .with_context(|| format!("strategy `{}` is invalid", config.strategy_id))?;
            if !seen.insert(config.strategy_id.clone()) {
                bail!("duplicate strategy id `{}`", config.strategy_id);
            }
        }
        Ok(out)
    }
}
