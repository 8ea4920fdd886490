//! Confluence resolver — the algorithmic core of the engine.
//!
//! Scored candidates are clustered per direction by zone overlap, same-family
//! duplicates collapse to the strongest member, clusters earn a confluence
//! bonus per extra distinct family, and opposing-direction clusters occupying
//! the same zone fight it out under the configured conflict policy.

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::diag::Diagnostic;
use crate::domain::signal::meta;
use crate::domain::{
    CandleWindow, Direction, Regime, ResolvedSignal, ScoredCandidate,
};

use super::risk::RiskModel;

/// Zone overlap tolerance: two anchors share a zone when their prices sit
/// within `price_fraction` of their midpoint and their window positions are
/// within `max_candle_gap` candles.
///
/// Both tests are symmetric by construction: the price test measures against
/// the midpoint of the pair, the time test against an absolute gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneTolerance {
    pub price_fraction: f64,
    pub max_candle_gap: usize,
}

impl Default for ZoneTolerance {
    fn default() -> Self {
        Self {
            price_fraction: 0.004,
            max_candle_gap: 5,
        }
    }
}

/// What to do when opposing clusters score within `conflict_epsilon` of each
/// other. The conservative default suppresses both sides rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Ambiguous conflicts drop both clusters.
    #[default]
    DiscardBoth,
    /// The higher-scoring cluster wins even inside the epsilon band
    /// (exact ties go to the long side for determinism).
    PreferStronger,
}

/// Float tolerance on the inclusive epsilon boundary, matching the combine
/// rule this engine descends from.
const EPSILON_SLACK: f64 = 1e-12;

struct Cluster {
    direction: Direction,
    members: Vec<ScoredCandidate>,
    /// Position of the cluster's first candidate in discovery order; final
    /// output order and tie-breaking are anchored to this.
    discovery: usize,
    alive: bool,
}

fn zones_overlap(
    window: &CandleWindow,
    a: &ScoredCandidate,
    b: &ScoredCandidate,
    zone: &ZoneTolerance,
) -> bool {
    let mid = 0.5 * (a.candidate.anchor_price + b.candidate.anchor_price);
    if mid <= 0.0 {
        return false;
    }
    let price_close =
        (a.candidate.anchor_price - b.candidate.anchor_price).abs() <= zone.price_fraction * mid;

    let idx_a = window.index_at_or_before(a.candidate.anchor_time);
    let idx_b = window.index_at_or_before(b.candidate.anchor_time);
    let time_close = idx_a.abs_diff(idx_b) <= zone.max_candle_gap;

    price_close && time_close
}

fn cluster_candidates(
    scored: Vec<ScoredCandidate>,
    window: &CandleWindow,
    zone: &ZoneTolerance,
) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    for (discovery, candidate) in scored.into_iter().enumerate() {
        let joined = clusters.iter_mut().find(|cluster| {
            cluster.direction == candidate.candidate.direction
                && cluster
                    .members
                    .iter()
                    .any(|member| zones_overlap(window, member, &candidate, zone))
        });
        match joined {
            Some(cluster) => cluster.members.push(candidate),
            None => clusters.push(Cluster {
                direction: candidate.candidate.direction,
                members: vec![candidate],
                discovery,
                alive: true,
            }),
        }
    }
    clusters
}

/// Per-cluster combine: same-family dedup, representative pick, bonus.
struct CombinedCluster {
    direction: Direction,
    discovery: usize,
    combined_score: f64,
    representative: ScoredCandidate,
    families: std::collections::BTreeSet<String>,
    detectors: std::collections::BTreeSet<String>,
    alive: bool,
}

fn combine_cluster(cluster: Cluster, config: &StrategyConfig) -> CombinedCluster {
    // Same-family dedup: keep the strongest candidate per family. A strict
    // `>` keeps the earliest member on ties, so discovery order breaks them.
    let mut best_per_family: Vec<&ScoredCandidate> = Vec::new();
    for member in &cluster.members {
        match best_per_family
            .iter_mut()
            .find(|best| best.candidate.family == member.candidate.family)
        {
            Some(best) => {
                if member.weighted_score > best.weighted_score {
                    *best = member;
                }
            }
            None => best_per_family.push(member),
        }
    }

    let representative = best_per_family
        .iter()
        .copied()
        .max_by(|a, b| a.weighted_score.total_cmp(&b.weighted_score))
        .expect("clusters are never empty")
        .clone();

    let families: std::collections::BTreeSet<String> = best_per_family
        .iter()
        .map(|c| c.candidate.family.clone())
        .collect();
    let detectors: std::collections::BTreeSet<String> = cluster
        .members
        .iter()
        .map(|c| c.candidate.detector_id.clone())
        .collect();

    // Bonus only when at least two distinct families agree; a lone family —
    // even one firing through several detectors — earns nothing extra.
    let extra_families = families.len().saturating_sub(1);
    let combined_score = representative.weighted_score
        + config.confluence_bonus_per_family * extra_families as f64;

    CombinedCluster {
        direction: cluster.direction,
        discovery: cluster.discovery,
        combined_score,
        representative,
        families,
        detectors,
        alive: cluster.alive,
    }
}

/// Cross-direction conflict resolution over combined clusters.
fn resolve_conflicts(
    clusters: &mut [CombinedCluster],
    config: &StrategyConfig,
    window: &CandleWindow,
    zone: &ZoneTolerance,
    policy: ConflictPolicy,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            if !clusters[i].alive || !clusters[j].alive {
                continue;
            }
            if clusters[i].direction == clusters[j].direction {
                continue;
            }
            if !zones_overlap(
                window,
                &clusters[i].representative,
                &clusters[j].representative,
                zone,
            ) {
                continue;
            }

            let (long_idx, short_idx) = if clusters[i].direction == Direction::Long {
                (i, j)
            } else {
                (j, i)
            };
            let long_score = clusters[long_idx].combined_score;
            let short_score = clusters[short_idx].combined_score;
            let delta = (long_score - short_score).abs();

            // The winner's anchor identifies the contested zone in diagnostics.
            let (winner_idx, loser_idx) = if long_score >= short_score {
                (long_idx, short_idx)
            } else {
                (short_idx, long_idx)
            };
            let anchor_price = clusters[winner_idx].representative.candidate.anchor_price;
            let anchor_time = clusters[winner_idx].representative.candidate.anchor_time;

            if delta <= config.conflict_epsilon + EPSILON_SLACK {
                match policy {
                    ConflictPolicy::DiscardBoth => {
                        clusters[long_idx].alive = false;
                        clusters[short_idx].alive = false;
                        diagnostics.push(Diagnostic::AmbiguousConflictDiscarded {
                            long_score,
                            short_score,
                            anchor_price,
                            anchor_time,
                        });
                        continue;
                    }
                    ConflictPolicy::PreferStronger => {}
                }
            }

            clusters[loser_idx].alive = false;
            diagnostics.push(Diagnostic::ConflictResolved {
                winner: clusters[winner_idx].direction,
                long_score,
                short_score,
                anchor_price,
                anchor_time,
            });
        }
    }
}

/// Resolve scored candidates into deduplicated, confluence-scored signals.
///
/// Output order is cluster-discovery order (the order the first member of
/// each surviving cluster appeared in the input), which keeps downstream
/// tie-breaking reproducible.
#[allow(clippy::too_many_arguments)]
pub fn resolve_confluence(
    scored: Vec<ScoredCandidate>,
    config: &StrategyConfig,
    window: &CandleWindow,
    regime: Regime,
    zone: &ZoneTolerance,
    policy: ConflictPolicy,
    risk_model: &dyn RiskModel,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<ResolvedSignal> {
    let clusters = cluster_candidates(scored, window, zone);
    let mut combined: Vec<CombinedCluster> = clusters
        .into_iter()
        .map(|cluster| combine_cluster(cluster, config))
        .collect();
    combined.sort_by_key(|c| c.discovery);

    resolve_conflicts(&mut combined, config, window, zone, policy, diagnostics);

    combined
        .into_iter()
        .filter(|cluster| cluster.alive)
        .map(|cluster| {
            let rep = &cluster.representative.candidate;
            let entry_price = rep
                .metadata
                .get(meta::ENTRY)
                .copied()
                .unwrap_or(rep.anchor_price);
            let risk_reward_ratio = rep
                .metadata
                .get(meta::RR)
                .copied()
                .or_else(|| risk_model.compute_rr(&rep.metadata))
                .unwrap_or(0.0);

            ResolvedSignal {
                direction: cluster.direction,
                combined_score: cluster.combined_score,
                contributing_families: cluster.families,
                contributing_detectors: cluster.detectors,
                entry_price,
                risk_reward_ratio,
                regime,
                anchor_price: rep.anchor_price,
                anchor_time: rep.anchor_time,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, RawCandidate};
    use crate::scoring::risk::LevelRiskModel;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(minute)
    }

    fn window() -> CandleWindow {
        let candles = (0..40)
            .map(|i| Candle {
                time: ts(5 * i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
            })
            .collect();
        CandleWindow::new(candles).unwrap()
    }

    fn scored(
        detector: &str,
        family: &str,
        direction: Direction,
        price: f64,
        minute: i64,
        weighted_score: f64,
    ) -> ScoredCandidate {
        ScoredCandidate {
            candidate: RawCandidate {
                detector_id: detector.into(),
                family: family.into(),
                direction,
                anchor_price: price,
                anchor_time: ts(minute),
                raw_strength: weighted_score,
                metadata: BTreeMap::new(),
            },
            weighted_score,
        }
    }

    fn resolve(
        candidates: Vec<ScoredCandidate>,
        config: &StrategyConfig,
        policy: ConflictPolicy,
    ) -> (Vec<ResolvedSignal>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let signals = resolve_confluence(
            candidates,
            config,
            &window(),
            Regime::Range,
            &ZoneTolerance::default(),
            policy,
            &LevelRiskModel,
            &mut diagnostics,
        );
        (signals, diagnostics)
    }

    #[test]
    fn same_family_candidates_dedup_to_max() {
        let config = StrategyConfig::new("t", []);
        let (signals, _) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.69),
                scored("b", "structure", Direction::Long, 100.1, 100, 1.638),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 1);
        // Max, never the sum; single family earns no bonus.
        assert!((signals[0].combined_score - 1.69).abs() < 1e-12);
        assert_eq!(signals[0].contributing_families.len(), 1);
        assert_eq!(signals[0].contributing_detectors.len(), 2);
    }

    #[test]
    fn distinct_families_earn_bonus() {
        let mut config = StrategyConfig::new("t", []);
        config.confluence_bonus_per_family = 0.30;
        let (signals, _) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.0),
                scored("b", "sr", Direction::Long, 100.1, 100, 0.8),
                scored("c", "fibo", Direction::Long, 100.2, 105, 0.6),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 1);
        // max 1.0 + 0.30 × (3 − 1)
        assert!((signals[0].combined_score - 1.6).abs() < 1e-12);
        assert_eq!(signals[0].contributing_families.len(), 3);
    }

    #[test]
    fn distant_zones_stay_separate() {
        let config = StrategyConfig::new("t", []);
        let (signals, _) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.0),
                scored("b", "sr", Direction::Long, 110.0, 100, 0.8),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 2);
    }

    #[test]
    fn time_gap_beyond_tolerance_separates_clusters() {
        let config = StrategyConfig::new("t", []);
        let (signals, _) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 0, 1.0),
                scored("b", "sr", Direction::Long, 100.0, 150, 0.8),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 2);
    }

    #[test]
    fn ambiguous_conflict_discards_both() {
        let mut config = StrategyConfig::new("t", []);
        config.conflict_epsilon = 0.05;
        let (signals, diagnostics) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.50),
                scored("b", "sr", Direction::Short, 100.1, 100, 1.47),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert!(signals.is_empty());
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic::AmbiguousConflictDiscarded { .. }]
        ));
    }

    #[test]
    fn epsilon_boundary_is_inclusive() {
        let mut config = StrategyConfig::new("t", []);
        config.conflict_epsilon = 0.05;
        let (signals, _) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.55),
                scored("b", "sr", Direction::Short, 100.1, 100, 1.50),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        // Delta exactly equals epsilon: still ambiguous.
        assert!(signals.is_empty());
    }

    #[test]
    fn clear_conflict_keeps_stronger_side() {
        let mut config = StrategyConfig::new("t", []);
        config.conflict_epsilon = 0.05;
        let (signals, diagnostics) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.80),
                scored("b", "sr", Direction::Short, 100.1, 100, 1.20),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Long);
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic::ConflictResolved {
                winner: Direction::Long,
                ..
            }]
        ));
    }

    #[test]
    fn prefer_stronger_policy_resolves_inside_epsilon() {
        let mut config = StrategyConfig::new("t", []);
        config.conflict_epsilon = 0.05;
        let (signals, diagnostics) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.50),
                scored("b", "sr", Direction::Short, 100.1, 100, 1.47),
            ],
            &config,
            ConflictPolicy::PreferStronger,
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Long);
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic::ConflictResolved { .. }]
        ));
    }

    #[test]
    fn opposing_clusters_in_distant_zones_both_survive() {
        let config = StrategyConfig::new("t", []);
        let (signals, diagnostics) = resolve(
            vec![
                scored("a", "structure", Direction::Long, 100.0, 100, 1.50),
                scored("b", "sr", Direction::Short, 112.0, 100, 1.49),
            ],
            &config,
            ConflictPolicy::DiscardBoth,
        );
        assert_eq!(signals.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn entry_and_rr_derive_from_representative_metadata() {
        let config = StrategyConfig::new("t", []);
        let mut candidate = scored("a", "structure", Direction::Long, 100.0, 100, 1.0);
        candidate
            .candidate
            .metadata
            .insert(meta::ENTRY.to_string(), 100.5);
        candidate
            .candidate
            .metadata
            .insert(meta::STOP.to_string(), 99.5);
        candidate
            .candidate
            .metadata
            .insert(meta::TARGET.to_string(), 103.5);
        let (signals, _) = resolve(vec![candidate], &config, ConflictPolicy::DiscardBoth);
        assert_eq!(signals[0].entry_price, 100.5);
        assert!((signals[0].risk_reward_ratio - 3.0).abs() < 1e-12);
    }

    #[test]
    fn explicit_rr_metadata_wins_over_risk_model() {
        let config = StrategyConfig::new("t", []);
        let mut candidate = scored("a", "structure", Direction::Long, 100.0, 100, 1.0);
        candidate.candidate.metadata.insert(meta::RR.to_string(), 4.2);
        candidate
            .candidate
            .metadata
            .insert(meta::ENTRY.to_string(), 100.5);
        candidate
            .candidate
            .metadata
            .insert(meta::STOP.to_string(), 99.5);
        candidate
            .candidate
            .metadata
            .insert(meta::TARGET.to_string(), 101.5);
        let (signals, _) = resolve(vec![candidate], &config, ConflictPolicy::DiscardBoth);
        assert_eq!(signals[0].risk_reward_ratio, 4.2);
    }
}
