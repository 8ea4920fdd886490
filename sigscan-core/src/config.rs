//! Strategy configuration — the immutable per-evaluation input.
//!
//! Defaults mirror the original knob set: absent weights mean 1.0, all four
//! regimes are allowed, and the soft-combine parameters carry their shipped
//! defaults. Validation fails fast on malformed numeric fields instead of
//! silently coercing at the point of use.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{DetectorId, Family, Regime};

/// Errors raised by [`StrategyConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("strategy_id must be non-empty")]
    MissingStrategyId,
    #[error("strategy `{strategy_id}`: field `{field}` must be finite, got {value}")]
    NonFinite {
        strategy_id: String,
        field: &'static str,
        value: f64,
    },
    #[error("strategy `{strategy_id}`: field `{field}` must be non-negative, got {value}")]
    Negative {
        strategy_id: String,
        field: &'static str,
        value: f64,
    },
    #[error("strategy `{strategy_id}`: weight for `{key}` must be finite and non-negative, got {value}")]
    BadWeight {
        strategy_id: String,
        key: String,
        value: f64,
    },
    #[error("strategy `{strategy_id}`: allowed_regimes must not be empty")]
    NoAllowedRegimes { strategy_id: String },
}

fn default_enabled() -> bool {
    true
}

fn default_min_score() -> f64 {
    1.0
}

fn default_min_rr() -> f64 {
    2.0
}

fn default_conflict_epsilon() -> f64 {
    0.05
}

fn default_confluence_bonus() -> f64 {
    0.25
}

fn default_allowed_regimes() -> BTreeSet<Regime> {
    Regime::ALL.into_iter().collect()
}

/// Immutable per-evaluation strategy configuration.
///
/// The engine treats this as read-only input; validation happens once at the
/// start of an evaluation (or after deserialization) and is fatal on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub strategy_id: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// When true, unknown detector ids are skipped with a diagnostic instead
    /// of failing the evaluation. Strict by default.
    #[serde(default)]
    pub lenient: bool,

    /// Allow-list of detector ids to run.
    #[serde(default)]
    pub detectors: BTreeSet<DetectorId>,

    /// Per-detector weight overrides; absent means 1.0.
    #[serde(default)]
    pub detector_weights: BTreeMap<DetectorId, f64>,

    /// Per-family weight overrides; absent means 1.0.
    #[serde(default)]
    pub family_weights: BTreeMap<Family, f64>,

    #[serde(default = "default_allowed_regimes")]
    pub allowed_regimes: BTreeSet<Regime>,

    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_min_rr")]
    pub min_rr: f64,

    /// Score-difference threshold below which an opposing-direction conflict
    /// is too close to call.
    #[serde(default = "default_conflict_epsilon")]
    pub conflict_epsilon: f64,

    /// Additive bonus per distinct extra family agreeing on a zone.
    #[serde(default = "default_confluence_bonus")]
    pub confluence_bonus_per_family: f64,
}

impl StrategyConfig {
    /// Minimal config enabling the given detectors, with all defaults.
    pub fn new(strategy_id: impl Into<String>, detectors: impl IntoIterator<Item = DetectorId>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            enabled: true,
            lenient: false,
            detectors: detectors.into_iter().collect(),
            detector_weights: BTreeMap::new(),
            family_weights: BTreeMap::new(),
            allowed_regimes: default_allowed_regimes(),
            min_score: default_min_score(),
            min_rr: default_min_rr(),
            conflict_epsilon: default_conflict_epsilon(),
            confluence_bonus_per_family: default_confluence_bonus(),
        }
    }

    /// Detector weight with the 1.0 fallback — never an error.
    pub fn detector_weight(&self, detector_id: &str) -> f64 {
        self.detector_weights.get(detector_id).copied().unwrap_or(1.0)
    }

    /// Family weight with the 1.0 fallback — never an error.
    pub fn family_weight(&self, family: &str) -> f64 {
        self.family_weights.get(family).copied().unwrap_or(1.0)
    }

    /// Fail-fast structural validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy_id.trim().is_empty() {
            return Err(ConfigError::MissingStrategyId);
        }

        let numeric_fields = [
            ("min_score", self.min_score),
            ("min_rr", self.min_rr),
            ("conflict_epsilon", self.conflict_epsilon),
            ("confluence_bonus_per_family", self.confluence_bonus_per_family),
        ];
        for (field, value) in numeric_fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite {
                    strategy_id: self.strategy_id.clone(),
                    field,
                    value,
                });
            }
        }
        for (field, value) in [
            ("min_rr", self.min_rr),
            ("conflict_epsilon", self.conflict_epsilon),
            ("confluence_bonus_per_family", self.confluence_bonus_per_family),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative {
                    strategy_id: self.strategy_id.clone(),
                    field,
                    value,
                });
            }
        }

        for (key, &value) in self.detector_weights.iter().chain(self.family_weights.iter()) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::BadWeight {
                    strategy_id: self.strategy_id.clone(),
                    key: key.clone(),
                    value,
                });
            }
        }

        if self.allowed_regimes.is_empty() {
            return Err(ConfigError::NoAllowedRegimes {
                strategy_id: self.strategy_id.clone(),
            });
        }

        Ok(())
    }

    /// Deterministic configuration fingerprint.
    ///
    /// `BTreeMap`/`BTreeSet` fields give the JSON canonical key order, so two
    /// identical configs hash identically across runs and platforms.
    pub fn config_id(&self) -> String {
        let json = serde_json::to_string(self).expect("StrategyConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StrategyConfig {
        let mut config = StrategyConfig::new(
            "structure_confluence",
            ["break_retest".to_string(), "double_top_bottom".to_string()],
        );
        config.detector_weights.insert("break_retest".into(), 1.3);
        config.family_weights.insert("structure".into(), 1.3);
        config
    }

    #[test]
    fn defaults_apply_on_deserialization() {
        let config: StrategyConfig =
            serde_json::from_str(r#"{"strategy_id": "bare"}"#).unwrap();
        assert!(config.enabled);
        assert!(!config.lenient);
        assert_eq!(config.min_score, 1.0);
        assert_eq!(config.min_rr, 2.0);
        assert_eq!(config.conflict_epsilon, 0.05);
        assert_eq!(config.confluence_bonus_per_family, 0.25);
        assert_eq!(config.allowed_regimes.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn absent_weights_fall_back_to_one() {
        let config = sample();
        assert_eq!(config.detector_weight("break_retest"), 1.3);
        assert_eq!(config.detector_weight("never_registered"), 1.0);
        assert_eq!(config.family_weight("structure"), 1.3);
        assert_eq!(config.family_weight("fibo"), 1.0);
    }

    #[test]
    fn validate_rejects_empty_strategy_id() {
        let mut config = sample();
        config.strategy_id = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingStrategyId)
        ));
    }

    #[test]
    fn validate_rejects_non_finite_threshold() {
        let mut config = sample();
        config.min_score = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "min_score", .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_epsilon() {
        let mut config = sample();
        config.conflict_epsilon = -0.01;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "conflict_epsilon", .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_weight() {
        let mut config = sample();
        config.family_weights.insert("fibo".into(), f64::INFINITY);
        assert!(matches!(config.validate(), Err(ConfigError::BadWeight { .. })));
    }

    #[test]
    fn validate_rejects_empty_regime_allowlist() {
        let mut config = sample();
        config.allowed_regimes.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoAllowedRegimes { .. })
        ));
    }

    #[test]
    fn config_id_is_stable_and_sensitive() {
        let config = sample();
        assert_eq!(config.config_id(), config.config_id());
        let mut other = sample();
        other.min_score = 1.5;
        assert_ne!(config.config_id(), other.config_id());
    }
}
