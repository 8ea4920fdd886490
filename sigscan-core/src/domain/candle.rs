//! Candle — the fundamental market data unit — and the validated window over it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLC candle for a single symbol at a single time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Basic OHLC sanity check: high >= low, high/low bracket open and close,
    /// all fields finite and positive.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Errors raised while constructing a [`CandleWindow`].
#[derive(Debug, thiserror::Error)]
pub enum CandleError {
    #[error("candle window is empty")]
    Empty,
    #[error("candle at index {index} is out of order ({prev} >= {current})")]
    OutOfOrder {
        index: usize,
        prev: NaiveDateTime,
        current: NaiveDateTime,
    },
    #[error("candle at index {index} failed the OHLC sanity check")]
    Insane { index: usize },
}

/// An immutable, time-ordered candle sequence.
///
/// Ordering is a construction invariant: timestamps are strictly increasing
/// (no duplicates) and every candle passes [`Candle::is_sane`]. Code holding
/// a `CandleWindow` never has to re-check either property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleWindow {
    candles: Vec<Candle>,
}

impl CandleWindow {
    pub fn new(candles: Vec<Candle>) -> Result<Self, CandleError> {
        if candles.is_empty() {
            return Err(CandleError::Empty);
        }
        for (index, candle) in candles.iter().enumerate() {
            if !candle.is_sane() {
                return Err(CandleError::Insane { index });
            }
            if index > 0 {
                let prev = candles[index - 1].time;
                if prev >= candle.time {
                    return Err(CandleError::OutOfOrder {
                        index,
                        prev,
                        current: candle.time,
                    });
                }
            }
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// The most recent candle. The non-empty invariant makes this total.
    pub fn last(&self) -> &Candle {
        self.candles.last().expect("window is never empty")
    }

    /// Index of the latest candle at or before `time`, or 0 if `time`
    /// precedes the window. Used to convert anchor timestamps into
    /// candle-gap distances for zone overlap tests.
    pub fn index_at_or_before(&self, time: NaiveDateTime) -> usize {
        match self.candles.binary_search_by_key(&time, |c| c.time) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        }
    }
}
