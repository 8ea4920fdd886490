//! Domain types for the signal scoring engine.

pub mod candle;
pub mod regime;
pub mod signal;

pub use candle::{Candle, CandleError, CandleWindow};
pub use regime::Regime;
pub use signal::{
    Direction, FinalSignal, RawCandidate, ResolvedSignal, ScoredCandidate,
};

/// Detector identifier type alias.
pub type DetectorId = String;

/// Family taxonomy tag type alias (e.g. "structure", "sr", "fibo").
pub type Family = String;
