//! Break & retest: price closes through an S/R level, then comes back to
//! test it while holding the break side.

use std::collections::BTreeMap;

use crate::detectors::util::{atr, clamp_strength, highest_high, lowest_low, target_from_risk};
use crate::domain::signal::meta;
use crate::domain::{CandleWindow, Direction, RawCandidate};
use crate::registry::{Detector, DetectorError};

/// Break of a structural level followed by a retest within tolerance.
///
/// The level is the extreme of the window segment preceding the last
/// `recent_lookback` candles; a break requires some recent close beyond it,
/// and the retest requires the latest candle to touch back into the level
/// band while still closing on the break side.
#[derive(Debug, Clone)]
pub struct BreakRetest {
    /// Candles counted as "recent" when searching for the break.
    pub recent_lookback: usize,
    /// Relative tolerance for the retest touch (0.002 = 0.2%).
    pub retest_tolerance: f64,
    pub atr_period: usize,
    pub reward_multiple: f64,
}

impl Default for BreakRetest {
    fn default() -> Self {
        Self {
            recent_lookback: 10,
            retest_tolerance: 0.002,
            atr_period: 14,
            reward_multiple: 2.0,
        }
    }
}

impl Detector for BreakRetest {
    fn id(&self) -> &str {
        "break_retest"
    }

    fn family(&self) -> &str {
        "structure"
    }

    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        let candles = window.candles();
        // Need an older segment to define the level plus the recent segment.
        if candles.len() < self.recent_lookback + 10 {
            return Ok(Vec::new());
        }

        let split = candles.len() - 1 - self.recent_lookback;
        let older = &candles[..split];
        let recent = &candles[split..candles.len() - 1];
        let last = window.last();

        let resistance = highest_high(older).expect("older segment is non-empty");
        let support = lowest_low(older).expect("older segment is non-empty");
        let volatility = atr(window, self.atr_period);
        if volatility <= 0.0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();

        // Bullish: broke above resistance, now retesting it from above.
        let broke_up = recent.iter().any(|c| c.close > resistance);
        let retests_up = last.low <= resistance * (1.0 + self.retest_tolerance)
            && last.close > resistance;
        if broke_up && retests_up {
            let best_break = recent
                .iter()
                .map(|c| c.close - resistance)
                .fold(0.0, f64::max);
            out.push(self.candidate(
                window,
                Direction::Long,
                resistance,
                best_break,
                volatility,
            ));
        }

        // Bearish mirror: broke below support, retesting from below.
        let broke_down = recent.iter().any(|c| c.close < support);
        let retests_down =
            last.high >= support * (1.0 - self.retest_tolerance) && last.close < support;
        if broke_down && retests_down {
            let best_break = recent.iter().map(|c| support - c.close).fold(0.0, f64::max);
            out.push(self.candidate(
                window,
                Direction::Short,
                support,
                best_break,
                volatility,
            ));
        }

        Ok(out.into_iter().flatten().collect())
    }
}

impl BreakRetest {
    fn candidate(
        &self,
        window: &CandleWindow,
        direction: Direction,
        level: f64,
        break_margin: f64,
        volatility: f64,
    ) -> Option<RawCandidate> {
        let last = window.last();
        let entry = last.close;
        let stop = match direction {
            Direction::Long => level - 0.5 * volatility,
            Direction::Short => level + 0.5 * volatility,
        };
        let target = target_from_risk(entry, stop, self.reward_multiple)?;

        let mut metadata = BTreeMap::new();
        metadata.insert(meta::ENTRY.to_string(), entry);
        metadata.insert(meta::STOP.to_string(), stop);
        metadata.insert(meta::TARGET.to_string(), target);
        metadata.insert("level".to_string(), level);

        Some(RawCandidate {
            detector_id: "break_retest".into(),
            family: "structure".into(),
            direction,
            anchor_price: level,
            anchor_time: last.time,
            // A clean break is worth more than a marginal one.
            raw_strength: clamp_strength(0.6 + 0.4 * (break_margin / volatility).min(1.0)),
            metadata,
        })
    }
}
