//! Regime & risk filter — the last gate before signals reach the caller.

use crate::config::StrategyConfig;
use crate::diag::{Diagnostic, FilterReject};
use crate::domain::{FinalSignal, ResolvedSignal};

/// Apply the regime allowlist and score/R:R minimums, then rank survivors
/// by descending combined score.
///
/// The sort is stable, so equal-scoring signals keep their cluster-discovery
/// order — repeated evaluations produce bit-identical output. Every rejection
/// is recorded as a diagnostic; nothing is dropped silently.
pub fn filter_signals(
    resolved: Vec<ResolvedSignal>,
    config: &StrategyConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FinalSignal> {
    let mut survivors: Vec<FinalSignal> = Vec::with_capacity(resolved.len());

    for signal in resolved {
        let reject = if !config.allowed_regimes.contains(&signal.regime) {
            Some(FilterReject::RegimeNotAllowed {
                regime: signal.regime,
            })
        } else if signal.combined_score < config.min_score {
            Some(FilterReject::ScoreBelowMin {
                score: signal.combined_score,
                min_score: config.min_score,
            })
        } else if signal.risk_reward_ratio < config.min_rr {
            Some(FilterReject::RrBelowMin {
                rr: signal.risk_reward_ratio,
                min_rr: config.min_rr,
            })
        } else {
            None
        };

        match reject {
            Some(reject) => diagnostics.push(Diagnostic::SignalRejected {
                direction: signal.direction,
                combined_score: signal.combined_score,
                reject,
            }),
            None => survivors.push(signal.into()),
        }
    }

    survivors.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    survivors
}
