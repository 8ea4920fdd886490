//! The scoring pipeline: weighting, confluence resolution, regime/risk
//! filtering.

pub mod confluence;
pub mod filter;
pub mod risk;
pub mod scorer;

pub use confluence::{resolve_confluence, ConflictPolicy, ZoneTolerance};
pub use filter::filter_signals;
pub use risk::{LevelRiskModel, RiskModel};
pub use scorer::score_candidates;
