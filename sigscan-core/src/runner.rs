//! Detector runner — resolves a strategy's detector allow-list against the
//! registry and collects raw candidates with provenance.

use crate::config::StrategyConfig;
use crate::diag::Diagnostic;
use crate::domain::{CandleWindow, RawCandidate};
use crate::registry::{DetectorRegistry, RegistryError};

/// Raw candidates plus the diagnostics accumulated while producing them.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub candidates: Vec<RawCandidate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Invoke every enabled detector against the window.
///
/// Detector ids run in deterministic (lexicographic) order — the
/// `BTreeSet` in the config fixes invocation order, which fixes candidate
/// discovery order downstream. Each detector sees only the window; one
/// detector's output is never visible to another.
///
/// Unknown ids are fatal for strict strategies and recorded-and-skipped for
/// lenient ones. A detector returning `Err` becomes a
/// [`Diagnostic::DetectorFailure`]; the remaining detectors still run.
pub fn run_detectors(
    registry: &DetectorRegistry,
    config: &StrategyConfig,
    window: &CandleWindow,
) -> Result<RunOutput, RegistryError> {
    let mut output = RunOutput::default();

    for detector_id in &config.detectors {
        let detector = match registry.get(detector_id) {
            Ok(detector) => detector,
            Err(err @ RegistryError::UnknownDetector(_)) => {
                if config.lenient {
                    output.diagnostics.push(Diagnostic::UnknownDetectorSkipped {
                        detector_id: detector_id.clone(),
                    });
                    continue;
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        match detector.detect(window) {
            Ok(mut candidates) => {
                // Provenance comes from the registration, not from whatever
                // the detector wrote into its own output.
                for candidate in &mut candidates {
                    candidate.detector_id = detector.id().to_string();
                    candidate.family = detector.family().to_string();
                }
                output.candidates.extend(candidates);
            }
            Err(failure) => {
                output.diagnostics.push(Diagnostic::DetectorFailure {
                    detector_id: detector_id.clone(),
                    message: failure.message,
                });
            }
        }
    }

    Ok(output)
}
