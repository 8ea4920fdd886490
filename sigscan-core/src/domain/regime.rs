//! Market regime taxonomy and a deterministic window classifier.

use serde::{Deserialize, Serialize};

use super::candle::CandleWindow;

/// Market condition classification gating which strategies may fire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    TrendBull,
    TrendBear,
    Range,
    Chop,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::TrendBull,
        Regime::TrendBear,
        Regime::Range,
        Regime::Chop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::TrendBull => "TREND_BULL",
            Regime::TrendBear => "TREND_BEAR",
            Regime::Range => "RANGE",
            Regime::Chop => "CHOP",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const FAST_PERIOD: usize = 20;
const SLOW_PERIOD: usize = 50;

/// Separation between fast and slow SMA (as a fraction of the slow SMA)
/// required to call a trend.
const TREND_THRESHOLD: f64 = 0.002;

/// Band width (as a fraction of the last close) below which a non-trending
/// window counts as an orderly range rather than chop.
const RANGE_WIDTH_THRESHOLD: f64 = 0.03;

fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period || period == 0 {
        return None;
    }
    let tail = &closes[closes.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Classify the window's market regime.
///
/// Fast/slow SMA separation decides trend direction; non-trending windows
/// split into `Range` (narrow recent band) and `Chop` (wide, directionless).
/// Windows shorter than the slow SMA period classify as `Chop` — there is
/// not enough history to claim anything stronger.
pub fn classify_regime(window: &CandleWindow) -> Regime {
    let closes: Vec<f64> = window.candles().iter().map(|c| c.close).collect();

    let (Some(fast), Some(slow)) = (sma(&closes, FAST_PERIOD), sma(&closes, SLOW_PERIOD)) else {
        return Regime::Chop;
    };

    if fast > slow * (1.0 + TREND_THRESHOLD) {
        return Regime::TrendBull;
    }
    if fast < slow * (1.0 - TREND_THRESHOLD) {
        return Regime::TrendBear;
    }

    let recent = &window.candles()[window.len() - FAST_PERIOD..];
    let high = recent.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = recent.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let last_close = window.last().close;

    if (high - low) / last_close <= RANGE_WIDTH_THRESHOLD {
        Regime::Range
    } else {
        Regime::Chop
    }
}
