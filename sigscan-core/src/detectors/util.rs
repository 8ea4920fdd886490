//! Shared helpers for detector implementations. Stateless and pure.

use crate::domain::{Candle, CandleWindow};

/// Average true range over the last `period` candles (approximate: plain
/// mean of true ranges, no Wilder smoothing). Returns 0.0 when the window is
/// too short to compute any true range.
pub fn atr(window: &CandleWindow, period: usize) -> f64 {
    let candles = window.candles();
    if candles.len() < 2 {
        return 0.0;
    }
    let mut trs: Vec<f64> = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        let high = candles[i].high;
        let low = candles[i].low;
        let prev_close = candles[i - 1].close;
        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        trs.push(tr);
    }
    let tail = if trs.len() > period {
        &trs[trs.len() - period..]
    } else {
        &trs[..]
    };
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Relative distance test: is `price` within `tolerance_ratio` of `level`?
pub fn near_level(price: f64, level: f64, tolerance_ratio: f64) -> bool {
    if level == 0.0 {
        return false;
    }
    (price - level).abs() / level.abs() <= tolerance_ratio
}

/// Highest high over `candles`, or `None` when empty.
pub fn highest_high(candles: &[Candle]) -> Option<f64> {
    candles
        .iter()
        .map(|c| c.high)
        .max_by(|a, b| a.total_cmp(b))
}

/// Lowest low over `candles`, or `None` when empty.
pub fn lowest_low(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.low).min_by(|a, b| a.total_cmp(b))
}

/// Swing-high pivots: indices whose high exceeds every neighbor within
/// `strength` candles on both sides. Returned in chronological order.
pub fn swing_highs(window: &CandleWindow, strength: usize) -> Vec<(usize, f64)> {
    pivots(window, strength, true)
}

/// Swing-low pivots, mirror of [`swing_highs`].
pub fn swing_lows(window: &CandleWindow, strength: usize) -> Vec<(usize, f64)> {
    pivots(window, strength, false)
}

fn pivots(window: &CandleWindow, strength: usize, highs: bool) -> Vec<(usize, f64)> {
    let candles = window.candles();
    let mut out = Vec::new();
    if candles.len() < 2 * strength + 1 {
        return out;
    }
    for i in strength..candles.len() - strength {
        let value = if highs { candles[i].high } else { candles[i].low };
        let is_pivot = (i - strength..=i + strength).filter(|&j| j != i).all(|j| {
            if highs {
                candles[j].high < value
            } else {
                candles[j].low > value
            }
        });
        if is_pivot {
            out.push((i, value));
        }
    }
    out
}

/// Profit target at `reward_multiple` times the entry-to-stop risk, in the
/// trade direction implied by the stop's side of the entry. `None` when the
/// stop does not sit on the losing side.
pub fn target_from_risk(entry: f64, stop: f64, reward_multiple: f64) -> Option<f64> {
    let risk = entry - stop;
    if risk == 0.0 || reward_multiple <= 0.0 {
        return None;
    }
    Some(entry + risk * reward_multiple)
}

/// Clamp a raw conviction measure into the [0, 1] strength scale.
pub fn clamp_strength(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
