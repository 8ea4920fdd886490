//! S/R break-and-close: the latest candle closes through the prior window's
//! support or resistance extreme.

use std::collections::BTreeMap;

use crate::detectors::util::{atr, clamp_strength, highest_high, lowest_low, target_from_risk};
use crate::domain::signal::meta;
use crate::domain::{CandleWindow, Direction, RawCandidate};
use crate::registry::{Detector, DetectorError};

/// Close-through of a support/resistance level.
///
/// Resistance/support are the extreme high/low over the `lookback` candles
/// preceding the latest one; a close beyond either level fires in the break
/// direction, with strength proportional to the break margin in ATR units.
#[derive(Debug, Clone)]
pub struct SrBreakClose {
    pub lookback: usize,
    pub atr_period: usize,
    pub reward_multiple: f64,
}

impl Default for SrBreakClose {
    fn default() -> Self {
        Self {
            lookback: 20,
            atr_period: 14,
            reward_multiple: 2.0,
        }
    }
}

impl SrBreakClose {
    fn candidate(
        &self,
        window: &CandleWindow,
        direction: Direction,
        level: f64,
        margin: f64,
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
            detector_id: "sr_break_close".into(),
            family: "sr".into(),
            direction,
            anchor_price: level,
            anchor_time: last.time,
            raw_strength: clamp_strength(margin / volatility),
            metadata,
        })
    }
}

impl Detector for SrBreakClose {
    fn id(&self) -> &str {
        "sr_break_close"
    }

    fn family(&self) -> &str {
        "sr"
    }

    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        let candles = window.candles();
        if candles.len() < self.lookback + 2 {
            return Ok(Vec::new());
        }

        let prior = &candles[candles.len() - 1 - self.lookback..candles.len() - 1];
        let resistance = highest_high(prior).expect("prior segment is non-empty");
        let support = lowest_low(prior).expect("prior segment is non-empty");
        let volatility = atr(window, self.atr_period);
        if volatility <= 0.0 {
            return Ok(Vec::new());
        }

        let last = window.last();
        let candidate = if last.close > resistance {
            self.candidate(
                window,
                Direction::Long,
                resistance,
                last.close - resistance,
                volatility,
            )
        } else if last.close < support {
            self.candidate(
                window,
                Direction::Short,
                support,
                support - last.close,
                volatility,
            )
        } else {
            None
        };

        Ok(candidate.into_iter().collect())
    }
}
