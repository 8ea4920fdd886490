//! Risk/reward derivation from candidate metadata.

use std::collections::BTreeMap;

use crate::domain::signal::meta;

/// Caller-supplied risk model, consulted when a candidate's metadata does not
/// carry an explicit `rr` value.
pub trait RiskModel: Send + Sync {
    /// Derive a risk/reward ratio from candidate metadata, or `None` if the
    /// metadata does not describe a computable setup.
    fn compute_rr(&self, metadata: &BTreeMap<String, f64>) -> Option<f64>;
}

/// Default risk model: derive R:R from the `entry`/`stop`/`target` level
/// keys detectors publish.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelRiskModel;

impl RiskModel for LevelRiskModel {
    fn compute_rr(&self, metadata: &BTreeMap<String, f64>) -> Option<f64> {
        let entry = metadata.get(meta::ENTRY).copied()?;
        let stop = metadata.get(meta::STOP).copied()?;
        let target = metadata.get(meta::TARGET).copied()?;

        let risk = (entry - stop).abs();
        let reward = (target - entry).abs();
        if !risk.is_finite() || !reward.is_finite() || risk <= 0.0 {
            return None;
        }
        // Stop and target must bracket the entry, otherwise the levels do
        // not describe a trade.
        if (target > entry) == (stop > entry) {
            return None;
        }
        Some(reward / risk)
    }
}
