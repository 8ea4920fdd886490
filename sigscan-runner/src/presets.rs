//! Named strategy presets over the built-in detectors.

use sigscan_core::{Regime, StrategyConfig};

/// Names accepted in a scan file's `presets` list, in stable order.
pub const PRESET_NAMES: [&str; 3] = ["structure_confluence", "fib_pullback", "range_fade"];

/// Look up a preset by name.
pub fn preset(name: &str) -> Option<StrategyConfig> {
    match name {
        "structure_confluence" => Some(structure_confluence()),
        "fib_pullback" => Some(fib_pullback()),
        "range_fade" => Some(range_fade()),
        _ => None,
    }
}

/// Breakout structure plus S/R agreement; the bread-and-butter trend entry.
fn structure_confluence() -> StrategyConfig {
    let mut config = StrategyConfig::new(
        "structure_confluence",
        [
            "sr_break_close".to_string(),
            "break_retest".to_string(),
            "double_top_bottom".to_string(),
        ],
    );
    config.family_weights.insert("structure".into(), 1.2);
    config.allowed_regimes =
        [Regime::TrendBull, Regime::TrendBear, Regime::Range].into_iter().collect();
    config.min_score = 0.9;
    config.min_rr = 1.8;
    config
}

/// Retracement entries in an established trend, confirmed by a rejection
/// candle at the level.
fn fib_pullback() -> StrategyConfig {
    let mut config = StrategyConfig::new(
        "fib_pullback",
        [
            "fibo_retrace_confluence".to_string(),
            "pinbar_at_level".to_string(),
        ],
    );
    config.family_weights.insert("fibo".into(), 1.3);
    config.allowed_regimes = [Regime::TrendBull, Regime::TrendBear].into_iter().collect();
    config.min_score = 0.7;
    config.min_rr = 2.0;
    config.confluence_bonus_per_family = 0.3;
    config
}

/// Fade rejections at range extremes; stays out of trending tape.
fn range_fade() -> StrategyConfig {
    let mut config = StrategyConfig::new(
        "range_fade",
        [
            "pinbar_at_level".to_string(),
            "double_top_bottom".to_string(),
        ],
    );
    config.allowed_regimes = [Regime::Range].into_iter().collect();
    config.min_score = 0.8;
    config.min_rr = 1.5;
    config
}
