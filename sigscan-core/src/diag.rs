//! Evaluation diagnostics — the observability channel for non-fatal events.
//!
//! Detector failures, lenient skips, conflict outcomes, and filter rejections
//! are returned as data alongside the signal list. Nothing in the pipeline is
//! dropped silently: every candidate that does not become a final signal has
//! a diagnostic explaining why (or contributed to a cluster that has one).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{DetectorId, Direction, Regime};

/// Why the regime & risk filter rejected a resolved signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterReject {
    RegimeNotAllowed { regime: Regime },
    ScoreBelowMin { score: f64, min_score: f64 },
    RrBelowMin { rr: f64, min_rr: f64 },
}

/// A recorded non-fatal event from one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    /// A detector returned an error; its candidates are absent from this
    /// evaluation but the rest of the batch continued.
    DetectorFailure {
        detector_id: DetectorId,
        message: String,
    },

    /// A lenient strategy referenced an unregistered detector id.
    UnknownDetectorSkipped { detector_id: DetectorId },

    /// Both sides of a within-epsilon opposing-direction conflict were
    /// dropped. A decision record, not an error.
    AmbiguousConflictDiscarded {
        long_score: f64,
        short_score: f64,
        anchor_price: f64,
        anchor_time: NaiveDateTime,
    },

    /// An opposing-direction conflict was resolved in favor of the
    /// higher-scoring side; the loser was discarded.
    ConflictResolved {
        winner: Direction,
        long_score: f64,
        short_score: f64,
        anchor_price: f64,
        anchor_time: NaiveDateTime,
    },

    /// A resolved signal failed the regime & risk filter.
    SignalRejected {
        direction: Direction,
        combined_score: f64,
        reject: FilterReject,
    },
}
