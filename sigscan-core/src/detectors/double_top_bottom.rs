//! Double top / double bottom: twin swing extremes at the same level with a
//! close beyond the neckline between them.

use std::collections::BTreeMap;

use crate::detectors::util::{
    clamp_strength, highest_high, lowest_low, swing_highs, swing_lows, target_from_risk,
};
use crate::domain::signal::meta;
use crate::domain::{CandleWindow, Direction, RawCandidate};
use crate::registry::{Detector, DetectorError};

/// Twin-extreme reversal pattern.
///
/// Two consecutive swing highs (lows) within `peak_tolerance` of each other
/// define the pattern; the neckline is the extreme between them. A close
/// beyond the neckline fires against the pattern's direction.
#[derive(Debug, Clone)]
pub struct DoubleTopBottom {
    /// Pivot strength: candles on each side a swing must dominate.
    pub pivot_strength: usize,
    /// Relative tolerance for the two extremes to count as "the same level".
    pub peak_tolerance: f64,
    pub reward_multiple: f64,
}

impl Default for DoubleTopBottom {
    fn default() -> Self {
        Self {
            pivot_strength: 2,
            peak_tolerance: 0.004,
            reward_multiple: 2.0,
        }
    }
}

impl DoubleTopBottom {
    fn build(
        &self,
        window: &CandleWindow,
        direction: Direction,
        neckline: f64,
        first_extreme: f64,
        second_extreme: f64,
    ) -> Option<RawCandidate> {
        let last = window.last();
        let entry = last.close;
        let stop = match direction {
            // Short against a double top: stop above the higher peak.
            Direction::Short => first_extreme.max(second_extreme),
            // Long against a double bottom: stop below the lower trough.
            Direction::Long => first_extreme.min(second_extreme),
        };
        let target = target_from_risk(entry, stop, self.reward_multiple)?;

        let mut metadata = BTreeMap::new();
        metadata.insert(meta::ENTRY.to_string(), entry);
        metadata.insert(meta::STOP.to_string(), stop);
        metadata.insert(meta::TARGET.to_string(), target);
        metadata.insert("neckline".to_string(), neckline);

        let mid = 0.5 * (first_extreme + second_extreme);
        let separation = (first_extreme - second_extreme).abs() / mid;
        // Tighter twin extremes are a cleaner pattern.
        let closeness = 1.0 - (separation / self.peak_tolerance).min(1.0);

        Some(RawCandidate {
            detector_id: "double_top_bottom".into(),
            family: "structure".into(),
            direction,
            anchor_price: neckline,
            anchor_time: last.time,
            raw_strength: clamp_strength(0.6 + 0.3 * closeness),
            metadata,
        })
    }
}

impl Detector for DoubleTopBottom {
    fn id(&self) -> &str {
        "double_top_bottom"
    }

    fn family(&self) -> &str {
        "structure"
    }

    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        let candles = window.candles();
        if candles.len() < 4 * self.pivot_strength + 3 {
            return Ok(Vec::new());
        }
        let last = window.last();
        let mut out = Vec::new();

        // Double top → short below the neckline.
        let highs = swing_highs(window, self.pivot_strength);
        if highs.len() >= 2 {
            let (i1, h1) = highs[highs.len() - 2];
            let (i2, h2) = highs[highs.len() - 1];
            let mid = 0.5 * (h1 + h2);
            if (h1 - h2).abs() / mid <= self.peak_tolerance {
                let neckline =
                    lowest_low(&candles[i1..=i2]).expect("pivot span is non-empty");
                if last.close < neckline {
                    out.push(self.build(window, Direction::Short, neckline, h1, h2));
                }
            }
        }

        // Double bottom → long above the neckline.
        let lows = swing_lows(window, self.pivot_strength);
        if lows.len() >= 2 {
            let (i1, l1) = lows[lows.len() - 2];
            let (i2, l2) = lows[lows.len() - 1];
            let mid = 0.5 * (l1 + l2);
            if (l1 - l2).abs() / mid <= self.peak_tolerance {
                let neckline =
                    highest_high(&candles[i1..=i2]).expect("pivot span is non-empty");
                if last.close > neckline {
                    out.push(self.build(window, Direction::Long, neckline, l1, l2));
                }
            }
        }

        Ok(out.into_iter().flatten().collect())
    }
}
