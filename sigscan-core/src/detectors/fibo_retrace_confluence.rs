//! Fibonacci retracement confluence: price pulls back into the classic
//! retracement band of the window's dominant leg.

use std::collections::BTreeMap;

use crate::detectors::util::{clamp_strength, near_level};
use crate::domain::signal::meta;
use crate::domain::{CandleWindow, Direction, RawCandidate};
use crate::registry::{Detector, DetectorError};

const RETRACE_RATIOS: [f64; 3] = [0.382, 0.5, 0.618];

/// Deepest ratio used for the protective stop on a retrace entry.
const STOP_RATIO: f64 = 0.786;

/// Pullback into the 0.382/0.5/0.618 retracement band of the dominant leg.
///
/// The leg is the window's extreme-to-extreme move over `lookback` candles;
/// an up leg with the latest close near a retracement level fires long
/// toward the leg high (the symmetric case fires short). Strength grows when
/// several ratios agree on the same zone.
#[derive(Debug, Clone)]
pub struct FiboRetraceConfluence {
    pub lookback: usize,
    /// Relative tolerance for "close is at the level".
    pub level_tolerance: f64,
    /// Minimum leg size as a fraction of price; tiny legs produce noise.
    pub min_leg_fraction: f64,
}

impl Default for FiboRetraceConfluence {
    fn default() -> Self {
        Self {
            lookback: 40,
            level_tolerance: 0.002,
            min_leg_fraction: 0.01,
        }
    }
}

impl Detector for FiboRetraceConfluence {
    fn id(&self) -> &str {
        "fibo_retrace_confluence"
    }

    fn family(&self) -> &str {
        "fibo"
    }

    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        let candles = window.candles();
        if candles.len() < 10 {
            return Ok(Vec::new());
        }
        let start = candles.len().saturating_sub(self.lookback);
        let leg = &candles[start..];

        // First occurrence wins ties, for determinism.
        let (mut high_idx, mut high) = (0usize, leg[0].high);
        let (mut low_idx, mut low) = (0usize, leg[0].low);
        for (i, c) in leg.iter().enumerate().skip(1) {
            if c.high > high {
                high_idx = i;
                high = c.high;
            }
            if c.low < low {
                low_idx = i;
                low = c.low;
            }
        }

        let span = high - low;
        let last = window.last();
        if span / last.close < self.min_leg_fraction {
            return Ok(Vec::new());
        }

        // Up leg: low first, high later, and the high is already in place
        // (the last candle is the pullback, not the leg itself).
        let candidate = if low_idx < high_idx && high_idx < leg.len() - 1 {
            let levels: Vec<f64> = RETRACE_RATIOS.iter().map(|r| high - r * span).collect();
            let matched: Vec<f64> = levels
                .iter()
                .copied()
                .filter(|&level| near_level(last.close, level, self.level_tolerance))
                .collect();
            matched.first().map(|&level| {
                self.candidate(window, Direction::Long, level, matched.len(), high, low)
            })
        } else if high_idx < low_idx && low_idx < leg.len() - 1 {
            let levels: Vec<f64> = RETRACE_RATIOS.iter().map(|r| low + r * span).collect();
            let matched: Vec<f64> = levels
                .iter()
                .copied()
                .filter(|&level| near_level(last.close, level, self.level_tolerance))
                .collect();
            matched.first().map(|&level| {
                self.candidate(window, Direction::Short, level, matched.len(), high, low)
            })
        } else {
            None
        };

        Ok(candidate.into_iter().collect())
    }
}

impl FiboRetraceConfluence {
    fn candidate(
        &self,
        window: &CandleWindow,
        direction: Direction,
        level: f64,
        matched_levels: usize,
        leg_high: f64,
        leg_low: f64,
    ) -> RawCandidate {
        let last = window.last();
        let span = leg_high - leg_low;
        let (stop, target) = match direction {
            // Long: stop below the deepest retrace, target back at the leg high.
            Direction::Long => (leg_high - STOP_RATIO * span, leg_high),
            Direction::Short => (leg_low + STOP_RATIO * span, leg_low),
        };

        let mut metadata = BTreeMap::new();
        metadata.insert(meta::ENTRY.to_string(), last.close);
        metadata.insert(meta::STOP.to_string(), stop);
        metadata.insert(meta::TARGET.to_string(), target);
        metadata.insert("level".to_string(), level);
        metadata.insert("leg_high".to_string(), leg_high);
        metadata.insert("leg_low".to_string(), leg_low);

        RawCandidate {
            detector_id: "fibo_retrace_confluence".into(),
            family: "fibo".into(),
            direction,
            anchor_price: level,
            anchor_time: last.time,
            raw_strength: clamp_strength(0.45 + 0.15 * matched_levels as f64),
            metadata,
        }
    }
}
