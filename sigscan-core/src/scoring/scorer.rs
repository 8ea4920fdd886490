//! Pure weighting transform from raw candidates to scored candidates.

use crate::config::StrategyConfig;
use crate::domain::{RawCandidate, ScoredCandidate};

/// `weighted_score = raw_strength × detector_weight × family_weight`.
///
/// Weight lookups fall back to 1.0 — an absent weight means "unweighted",
/// never an error. Deterministic: no randomness, no clock, preserves input
/// order.
pub fn score_candidates(
    candidates: Vec<RawCandidate>,
    config: &StrategyConfig,
) -> Vec<ScoredCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            let detector_weight = config.detector_weight(&candidate.detector_id);
            let family_weight = config.family_weight(&candidate.family);
            let weighted_score = candidate.raw_strength * detector_weight * family_weight;
            ScoredCandidate {
                candidate,
                weighted_score,
            }
        })
        .collect()
}
