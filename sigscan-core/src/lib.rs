//! sigscan-core — technical-analysis signal scoring engine.
//!
//! Given a candle window and a strategy configuration, the engine runs the
//! enabled pattern detectors, weights their raw candidates, resolves
//! confluence and cross-direction conflicts, and filters by regime and
//! risk/reward:
//!
//! `StrategyConfig + CandleWindow → runner → scorer → confluence resolver →
//! regime & risk filter → ranked FinalSignals`
//!
//! The pipeline is a pure function of its inputs: no cross-call state, no
//! clock, no randomness. The only shared resource is the detector registry,
//! which is fully built before evaluation starts and read-only afterwards,
//! so one engine instance serves any number of threads.

pub mod config;
pub mod detectors;
pub mod diag;
pub mod domain;
pub mod engine;
pub mod registry;
pub mod runner;
pub mod scoring;

pub use config::{ConfigError, StrategyConfig};
pub use diag::{Diagnostic, FilterReject};
pub use domain::{
    Candle, CandleError, CandleWindow, Direction, FinalSignal, RawCandidate, Regime,
    ResolvedSignal, ScoredCandidate,
};
pub use engine::{Evaluation, EngineError, SignalEngine};
pub use registry::{
    Detector, DetectorError, DetectorProvider, DetectorRegistry, RegistryError,
};
pub use scoring::{ConflictPolicy, LevelRiskModel, RiskModel, ZoneTolerance};
