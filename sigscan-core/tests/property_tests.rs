//! Property tests for the scoring pipeline invariants.

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use sigscan_core::{
    Candle, CandleWindow, Detector, DetectorError, DetectorRegistry, Direction, RawCandidate,
    Regime, SignalEngine, StrategyConfig,
};

fn ts(minute: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + chrono::Duration::minutes(minute)
}

fn window() -> CandleWindow {
    let candles = (0..80)
        .map(|i| Candle {
            time: ts(5 * i),
            open: 100.0,
            high: 100.8,
            low: 99.2,
            close: 100.0 + (i % 4) as f64 * 0.05,
        })
        .collect();
    CandleWindow::new(candles).unwrap()
}

fn candidate(family: &str, direction: Direction, strength: f64, minute: i64) -> RawCandidate {
    let mut metadata = BTreeMap::new();
    metadata.insert("rr".to_string(), 2.5);
    RawCandidate {
        detector_id: "scripted".into(),
        family: family.into(),
        direction,
        anchor_price: 100.0,
        anchor_time: ts(minute),
        raw_strength: strength,
        metadata,
    }
}

/// One scripted detector per family so the runner's provenance rewrite keeps
/// the intended family on each candidate.
struct FamilyScripted {
    id: String,
    family: String,
    candidates: Vec<RawCandidate>,
}

impl Detector for FamilyScripted {
    fn id(&self) -> &str {
        &self.id
    }
    fn family(&self) -> &str {
        &self.family
    }
    fn detect(&self, _window: &CandleWindow) -> Result<Vec<RawCandidate>, DetectorError> {
        Ok(self.candidates.clone())
    }
}

fn evaluate_families(
    groups: Vec<(String, Vec<RawCandidate>)>,
    bonus: f64,
    epsilon: f64,
) -> sigscan_core::Evaluation {
    let mut registry = DetectorRegistry::new();
    let mut ids = Vec::new();
    for (n, (family, candidates)) in groups.into_iter().enumerate() {
        let id = format!("scripted_{n}");
        ids.push(id.clone());
        registry
            .register(Arc::new(FamilyScripted {
                id,
                family,
                candidates,
            }))
            .unwrap();
    }
    let engine = SignalEngine::new(Arc::new(registry));
    let mut config = StrategyConfig::new("prop", ids);
    config.min_score = 0.0;
    config.min_rr = 0.0;
    config.confluence_bonus_per_family = bonus;
    config.conflict_epsilon = epsilon;
    engine
        .evaluate_with_regime(&config, &window(), Regime::Range)
        .unwrap()
}

fn arb_strength() -> impl Strategy<Value = f64> {
    (1u32..=1000).prop_map(|n| n as f64 / 1000.0)
}

proptest! {
    /// Same-family candidates in one zone never sum: the combined score is
    /// exactly the strongest member (weights are all 1.0 here).
    #[test]
    fn same_family_never_double_counts(
        strengths in prop::collection::vec(arb_strength(), 1..8),
    ) {
        let candidates: Vec<RawCandidate> = strengths
            .iter()
            .map(|&s| candidate("structure", Direction::Long, s, 200))
            .collect();
        let max = strengths.iter().cloned().fold(f64::MIN, f64::max);

        let evaluation =
            evaluate_families(vec![("structure".to_string(), candidates)], 0.25, 0.05);
        prop_assert_eq!(evaluation.signals.len(), 1);
        prop_assert!((evaluation.signals[0].combined_score - max).abs() < 1e-12);
    }

    /// Adding a weaker candidate from a new family raises the combined score
    /// by exactly the per-family bonus.
    #[test]
    fn new_family_adds_exactly_the_bonus(
        base in arb_strength(),
        extra in arb_strength(),
        bonus in 0.05f64..0.5,
    ) {
        let extra = extra.min(base); // keep the representative stable
        let before = evaluate_families(
            vec![("structure".to_string(), vec![candidate("structure", Direction::Long, base, 200)])],
            bonus,
            0.05,
        );
        let after = evaluate_families(
            vec![
                ("structure".to_string(), vec![candidate("structure", Direction::Long, base, 200)]),
                ("sr".to_string(), vec![candidate("sr", Direction::Long, extra, 200)]),
            ],
            bonus,
            0.05,
        );
        prop_assert_eq!(before.signals.len(), 1);
        prop_assert_eq!(after.signals.len(), 1);
        let delta = after.signals[0].combined_score - before.signals[0].combined_score;
        prop_assert!((delta - bonus).abs() < 1e-9);
    }

    /// Opposing zones within epsilon of each other are both suppressed;
    /// beyond epsilon exactly one survives, and it is the stronger side.
    #[test]
    fn conflict_resolution_respects_epsilon(
        long_strength in arb_strength(),
        short_strength in arb_strength(),
        epsilon in 0.01f64..0.2,
    ) {
        let evaluation = evaluate_families(
            vec![
                ("structure".to_string(), vec![candidate("structure", Direction::Long, long_strength, 200)]),
                ("sr".to_string(), vec![candidate("sr", Direction::Short, short_strength, 200)]),
            ],
            0.0,
            epsilon,
        );
        let diff = (long_strength - short_strength).abs();
        if diff <= epsilon + 1e-12 {
            prop_assert!(evaluation.signals.is_empty());
        } else {
            prop_assert_eq!(evaluation.signals.len(), 1);
            let expect = if long_strength > short_strength {
                Direction::Long
            } else {
                Direction::Short
            };
            prop_assert_eq!(evaluation.signals[0].direction, expect);
        }
    }

    /// Every emitted signal clears the configured floors, and the list is
    /// sorted by descending combined score.
    #[test]
    fn filters_and_ordering_hold(
        strengths in prop::collection::vec(arb_strength(), 0..10),
        min_score in 0.0f64..0.9,
        min_rr in 0.0f64..3.0,
    ) {
        // Spread candidates across separated zones so they do not cluster.
        let candidates: Vec<RawCandidate> = strengths
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let mut c = candidate("structure", Direction::Long, s, 200);
                c.anchor_price = 100.0 + 5.0 * i as f64;
                c
            })
            .collect();

        let mut registry = DetectorRegistry::new();
        registry
            .register(Arc::new(FamilyScripted {
                id: "scripted_0".into(),
                family: "structure".into(),
                candidates,
            }))
            .unwrap();
        let engine = SignalEngine::new(Arc::new(registry));
        let mut config = StrategyConfig::new("prop", ["scripted_0".to_string()]);
        config.min_score = min_score;
        config.min_rr = min_rr;

        let evaluation = engine
            .evaluate_with_regime(&config, &window(), Regime::Range)
            .unwrap();
        for signal in &evaluation.signals {
            prop_assert!(signal.combined_score >= min_score);
            prop_assert!(signal.risk_reward_ratio >= min_rr);
        }
        for pair in evaluation.signals.windows(2) {
            prop_assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }

    /// Evaluation is a pure function of its inputs: identical inputs
    /// serialize to identical bytes.
    #[test]
    fn evaluation_is_deterministic(
        strengths in prop::collection::vec(arb_strength(), 0..6),
    ) {
        let candidates: Vec<RawCandidate> = strengths
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let dir = if i % 2 == 0 { Direction::Long } else { Direction::Short };
                let mut c = candidate("structure", dir, s, 100 + 20 * i as i64);
                c.anchor_price = 100.0 + 2.0 * i as f64;
                c
            })
            .collect();
        let groups = vec![("structure".to_string(), candidates)];
        let first = evaluate_families(groups.clone(), 0.25, 0.05);
        let second = evaluate_families(groups, 0.25, 0.05);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
