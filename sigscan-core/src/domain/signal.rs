//! Candidate and signal types flowing through the scoring pipeline.
//!
//! The pipeline refines in stages: detectors emit [`RawCandidate`]s, the
//! scorer weights them into [`ScoredCandidate`]s, the confluence resolver
//! merges them into [`ResolvedSignal`]s, and the regime/risk filter promotes
//! survivors to [`FinalSignal`]s. Every stage's output is immutable once
//! produced; nothing is shared across evaluations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::regime::Regime;
use super::{DetectorId, Family};

/// Directional bias of a candidate or signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Conventional metadata keys detectors use to publish structural levels.
///
/// The engine reads these when deriving entry price and risk/reward; any
/// other keys ride along untouched for downstream consumers.
pub mod meta {
    pub const ENTRY: &str = "entry";
    pub const STOP: &str = "stop";
    pub const TARGET: &str = "target";
    pub const RR: &str = "rr";
}

/// A single detector's raw detection, before any weighting.
///
/// `family` is owned by the detector's registration, not the strategy: it is
/// the taxonomy tag confluence counting runs on. `metadata` carries numeric
/// context (levels, ratios) keyed by convention — see [`meta`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub detector_id: DetectorId,
    pub family: Family,
    pub direction: Direction,
    pub anchor_price: f64,
    pub anchor_time: NaiveDateTime,
    /// Detector conviction in [0, 1].
    pub raw_strength: f64,
    pub metadata: BTreeMap<String, f64>,
}

/// A raw candidate with its strategy-weighted score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: RawCandidate,
    /// `raw_strength × detector_weight × family_weight`.
    pub weighted_score: f64,
}

/// The outcome of merging one or more confluent scored candidates.
///
/// `contributing_families` never contains a family twice: merging candidates
/// from the same family is deduplication, not confluence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSignal {
    pub direction: Direction,
    pub combined_score: f64,
    pub contributing_families: BTreeSet<Family>,
    pub contributing_detectors: BTreeSet<DetectorId>,
    pub entry_price: f64,
    pub risk_reward_ratio: f64,
    pub regime: Regime,
    /// Zone anchor of the cluster's representative candidate, kept for
    /// conflict detection and reporting.
    pub anchor_price: f64,
    pub anchor_time: NaiveDateTime,
}

/// A resolved signal that passed the regime & risk filter. Terminal and
/// immutable; returned to the caller ranked by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSignal {
    pub direction: Direction,
    pub combined_score: f64,
    pub contributing_families: BTreeSet<Family>,
    pub contributing_detectors: BTreeSet<DetectorId>,
    pub entry_price: f64,
    pub risk_reward_ratio: f64,
    pub regime: Regime,
    pub anchor_price: f64,
    pub anchor_time: NaiveDateTime,
}

impl From<ResolvedSignal> for FinalSignal {
    fn from(signal: ResolvedSignal) -> Self {
        Self {
            direction: signal.direction,
            combined_score: signal.combined_score,
            contributing_families: signal.contributing_families,
            contributing_detectors: signal.contributing_detectors,
            entry_price: signal.entry_price,
            risk_reward_ratio: signal.risk_reward_ratio,
            regime: signal.regime,
            anchor_price: signal.anchor_price,
            anchor_time: signal.anchor_time,
        }
    }
}
