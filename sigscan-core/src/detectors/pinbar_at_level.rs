//! Pin bar at a level: a dominant-wick rejection candle printed into
//! support or resistance.

use std::collections::BTreeMap;

use crate::detectors::util::{clamp_strength, highest_high, lowest_low, target_from_risk};
use crate::domain::signal::meta;
use crate::domain::{Candle, CandleWindow, Direction, RawCandidate};
use crate::registry::{Detector, DetectorError};

/// Rejection candle (pin bar) at a support/resistance extreme.
///
/// A bullish pin needs a lower wick dominating the candle (at least
/// `wick_body_ratio` times the body and `wick_range_ratio` of the full
/// range) with the wick probing the prior window's support. Bearish mirror
/// at resistance.
#[derive(Debug, Clone)]
pub struct PinbarAtLevel {
    pub lookback: usize,
    pub wick_body_ratio: f64,
    pub wick_range_ratio: f64,
    /// Relative tolerance for the wick-to-level touch.
    pub level_tolerance: f64,
    pub reward_multiple: f64,
}

impl Default for PinbarAtLevel {
    fn default() -> Self {
        Self {
            lookback: 20,
            wick_body_ratio: 2.0,
            wick_range_ratio: 0.6,
            level_tolerance: 0.003,
            reward_multiple: 2.0,
        }
    }
}

fn lower_wick(c: &Candle) -> f64 {
    c.open.min(c.close) - c.low
}

fn upper_wick(c: &Candle) -> f64 {
    c.high - c.open.max(c.close)
}

impl PinbarAtLevel {
    fn is_pin(&self, wick: f64, candle: &Candle) -> bool {
        let range = candle.range();
        range > 0.0
            && wick >= self.wick_body_ratio * candle.body()
            && wick >= self.wick_range_ratio * range
    }

    fn candidate(
        &self,
        window: &CandleWindow,
        direction: Direction,
        level: f64,
        wick: f64,
    ) -> Option<RawCandidate> {
        let last = window.last();
        let entry = last.close;
        let stop = match direction {
            // Stop sits just beyond the rejection wick.
            Direction::Long => last.low - 0.1 * last.range(),
            Direction::Short => last.high + 0.1 * last.range(),
        };
        let target = target_from_risk(entry, stop, self.reward_multiple)?;

        let mut metadata = BTreeMap::new();
        metadata.insert(meta::ENTRY.to_string(), entry);
        metadata.insert(meta::STOP.to_string(), stop);
        metadata.insert(meta::TARGET.to_string(), target);
        metadata.insert("level".to_string(), level);

        Some(RawCandidate {
            detector_id: "pinbar_at_level".into(),
            family: "pattern".into(),
            direction,
            anchor_price: level,
            anchor_time: last.time,
            raw_strength: clamp_strength(wick / last.range()),
            metadata,
        })
    }
}

impl Detector for PinbarAtLevel {
    fn id(&self) -> &str {
        "pinbar_at_level"
    }

    fn family(&self) -> &str {
        "pattern"
    }

    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        let candles = window.candles();
        if candles.len() < self.lookback + 2 {
            return Ok(Vec::new());
        }

        let prior = &candles[candles.len() - 1 - self.lookback..candles.len() - 1];
        let support = lowest_low(prior).expect("prior segment is non-empty");
        let resistance = highest_high(prior).expect("prior segment is non-empty");
        let last = window.last();
        let mut out = Vec::new();

        let low_wick = lower_wick(last);
        if self.is_pin(low_wick, last)
            && last.low <= support * (1.0 + self.level_tolerance)
        {
            out.push(self.candidate(window, Direction::Long, support, low_wick));
        }

        let high_wick = upper_wick(last);
        if self.is_pin(high_wick, last)
            && last.high >= resistance * (1.0 - self.level_tolerance)
        {
            out.push(self.candidate(window, Direction::Short, resistance, high_wick));
        }

        Ok(out.into_iter().flatten().collect())
    }
}
