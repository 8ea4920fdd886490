//! Detector trait and the explicitly-constructed detector registry.
//!
//! The registry is built once, during an initialization phase, and then
//! treated as read-only for the lifetime of concurrent evaluations. There is
//! no ambient global state: tests construct isolated registries with fakes,
//! and production code passes one `Arc<DetectorRegistry>` around.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{CandleWindow, RawCandidate};

/// Error produced by a detector during evaluation.
///
/// Detectors are opaque plugins, so this is a plain message rather than a
/// structured taxonomy; the runner records it and moves on.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DetectorError {
    pub message: String,
}

impl DetectorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A pluggable pattern/structure detector.
///
/// # Architecture invariant
/// `detect` receives only the candle window. Implementations must not retain
/// cross-call mutable state — the engine relies on detectors being pure
/// functions of the window for evaluation determinism.
pub trait Detector: Send + Sync {
    /// Stable identifier referenced by strategy configs (e.g. "break_retest").
    fn id(&self) -> &str;

    /// Family taxonomy tag (e.g. "structure", "sr", "fibo"). Owned by the
    /// registration, not the strategy.
    fn family(&self) -> &str;

    /// Inspect the window and return zero or more raw candidates.
    fn detect(&self, window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError>;
}

/// Registration and lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("detector `{0}` is already registered with a different implementation")]
    DuplicateDetector(String),
    #[error("unknown detector: {0}")]
    UnknownDetector(String),
}

/// A provider contributes detectors during the explicit initialization phase.
///
/// This replaces import-time registration side effects: callers hand
/// `DetectorRegistry::build` a list of providers, and the returned registry
/// is complete before the first evaluation starts.
pub trait DetectorProvider {
    fn provide(&self, registry: &mut DetectorRegistry) -> Result<(), RegistryError>;
}

/// Maps detector ids to implementations.
///
/// `BTreeMap` keeps iteration order deterministic, which in turn keeps
/// detector invocation order (and therefore diagnostics order) reproducible.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: BTreeMap<String, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    /// An empty registry. Production code usually wants
    /// [`with_builtins`](Self::with_builtins) or [`build`](Self::build).
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in detector suite.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::detectors::register_builtins(&mut registry)
            .expect("built-in detector ids are unique");
        registry
    }

    /// The initialization phase: built-ins plus every provider's detectors.
    /// The returned registry is complete; callers should treat it as frozen.
    pub fn build(providers: &[Box<dyn DetectorProvider>]) -> Result<Self, RegistryError> {
        let mut registry = Self::with_builtins();
        for provider in providers {
            provider.provide(&mut registry)?;
        }
        Ok(registry)
    }

    /// Register a detector under its own id.
    ///
    /// Re-registering the exact same instance is an accepted no-op;
    /// registering a different implementation under a taken id is a
    /// [`RegistryError::DuplicateDetector`].
    pub fn register(&mut self, detector: Arc<dyn Detector>) -> Result<(), RegistryError> {
        let id = detector.id().to_string();
        if let Some(existing) = self.detectors.get(&id) {
            if Arc::ptr_eq(existing, &detector) {
                return Ok(());
            }
            return Err(RegistryError::DuplicateDetector(id));
        }
        self.detectors.insert(id, detector);
        Ok(())
    }

    pub fn get(&self, detector_id: &str) -> Result<&Arc<dyn Detector>, RegistryError> {
        self.detectors
            .get(detector_id)
            .ok_or_else(|| RegistryError::UnknownDetector(detector_id.to_string()))
    }

    pub fn contains(&self, detector_id: &str) -> bool {
        self.detectors.contains_key(detector_id)
    }

    /// Registered ids in deterministic (lexicographic) order. The iterator
    /// borrows the registry, so it is finite and restartable.
    pub fn list_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.detectors.keys().map(String::as_str)
    }

    /// Registered (id, family) pairs in deterministic order.
    pub fn list_with_families(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.detectors
            .iter()
            .map(|(id, det)| (id.as_str(), det.family()))
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("ids", &self.detectors.keys().collect::<Vec<_>>())
            .finish()
    }
}
