//! Engine façade — one pure evaluation of `(StrategyConfig, CandleWindow)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, StrategyConfig};
use crate::diag::Diagnostic;
use crate::domain::regime::classify_regime;
use crate::domain::{CandleWindow, FinalSignal, Regime};
use crate::registry::{DetectorRegistry, RegistryError};
use crate::runner::run_detectors;
use crate::scoring::{
    filter_signals, resolve_confluence, score_candidates, ConflictPolicy, LevelRiskModel,
    RiskModel, ZoneTolerance,
};

/// Errors that abort an evaluation. Per-detector failures are not here —
/// those are isolated and reported through [`Evaluation::diagnostics`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("strategy `{0}` is disabled")]
    StrategyDisabled(String),
}

/// The complete result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub regime: Regime,
    /// Final signals, ranked by descending combined score (stable).
    pub signals: Vec<FinalSignal>,
    /// Non-fatal events: detector failures, lenient skips, conflict
    /// outcomes, filter rejections.
    pub diagnostics: Vec<Diagnostic>,
}

/// The signal scoring engine.
///
/// Holds the frozen registry plus engine-level policy knobs; every call to
/// [`evaluate`](Self::evaluate) is a pure function of the strategy config and
/// window — the engine keeps no cross-call state, so one instance may serve
/// any number of threads.
pub struct SignalEngine {
    registry: Arc<DetectorRegistry>,
    risk_model: Arc<dyn RiskModel>,
    zone: ZoneTolerance,
    conflict_policy: ConflictPolicy,
}

impl SignalEngine {
    pub fn new(registry: Arc<DetectorRegistry>) -> Self {
        Self {
            registry,
            risk_model: Arc::new(LevelRiskModel),
            zone: ZoneTolerance::default(),
            conflict_policy: ConflictPolicy::default(),
        }
    }

    pub fn with_risk_model(mut self, risk_model: Arc<dyn RiskModel>) -> Self {
        self.risk_model = risk_model;
        self
    }

    pub fn with_zone_tolerance(mut self, zone: ZoneTolerance) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Evaluate a strategy against a window, classifying the regime from the
    /// window itself.
    pub fn evaluate(
        &self,
        config: &StrategyConfig,
        window: &CandleWindow,
    ) -> Result<Evaluation, EngineError> {
        self.evaluate_with_regime(config, window, classify_regime(window))
    }

    /// Evaluate with a caller-supplied regime (e.g. from a higher-timeframe
    /// classifier).
    pub fn evaluate_with_regime(
        &self,
        config: &StrategyConfig,
        window: &CandleWindow,
        regime: Regime,
    ) -> Result<Evaluation, EngineError> {
        config.validate()?;
        if !config.enabled {
            return Err(EngineError::StrategyDisabled(config.strategy_id.clone()));
        }

        let run = run_detectors(&self.registry, config, window)?;
        let mut diagnostics = run.diagnostics;

        let scored = score_candidates(run.candidates, config);
        let resolved = resolve_confluence(
            scored,
            config,
            window,
            regime,
            &self.zone,
            self.conflict_policy,
            self.risk_model.as_ref(),
            &mut diagnostics,
        );
        let signals = filter_signals(resolved, config, &mut diagnostics);

        Ok(Evaluation {
            regime,
            signals,
            diagnostics,
        })
    }
}
