//! Integration tests for controller selection.
//!
//! Run with: cargo test -p azr-policy --test selection_policy

use azr_policy::{PolicyConfig, SelectionContext, SelectionMode, SelectionPolicy};
use azr_types::{AzrError, Difficulty, TaskParameters};
use proptest::prelude::*;

fn policy(pool: usize, seed: u64) -> SelectionPolicy {
    match SelectionPolicy::new(pool, PolicyConfig::default().with_seed(seed)) {
        Ok(p) => p,
        Err(e) => panic!("policy construction failed: {e}"),
    }
}

#[test]
fn floor_holds_after_long_failure_streak() {
    let mut p = policy(3, 11);
    for _ in 0..100 {
        assert!(p.update(0, -1.0, "navigation", false).is_ok());
    }
    assert!((p.weight(0).unwrap_or_default() - 0.1).abs() < 1e-12);
    assert_eq!(p.weight(1), Some(1.0));
}

#[test]
fn context_from_task_routes_match_task() {
    let task = TaskParameters::new("t-1", "Stack blocks", "stacking", Difficulty::Medium);
    let mut p = policy(4, 5);
    assert!(p.update(2, 1.0, "stacking", true).is_ok());

    let ctx = SelectionContext::for_task(&task);
    let hits = (0..1000)
        .filter_map(|_| p.select(SelectionMode::MatchTask, ctx).ok())
        .filter(|&i| i == 2)
        .count();
    assert!(hits >= 600, "hits = {hits}");
}

#[test]
fn empty_pool_reports_no_controllers() {
    let mut p = policy(0, 1);
    let err = p.select(SelectionMode::Random, SelectionContext::new("grasping"));
    assert!(matches!(err, Err(AzrError::NoControllersAvailable(_))));
    assert!(p.probabilities().is_empty());
}

#[test]
fn config_deserializes_with_defaults() {
    let json = r#"{ "learning_rate": 0.25, "seed": 3 }"#;
    let config: PolicyConfig = serde_json::from_str(json).unwrap_or_default();
    assert!((config.learning_rate - 0.25).abs() < f64::EPSILON);
    assert!((config.min_weight - 0.1).abs() < f64::EPSILON);
    assert_eq!(config.seed, Some(3));
}

proptest! {
    #[test]
    fn weights_never_fall_below_floor(
        rewards in proptest::collection::vec(-3.0..3.0f64, 1..200),
        lr in 0.0..1.0f64,
    ) {
        let config = PolicyConfig::default().with_learning_rate(lr).with_seed(0);
        let mut p = SelectionPolicy::new(2, config).unwrap_or_else(|e| panic!("{e}"));
        for (i, r) in rewards.iter().enumerate() {
            prop_assert!(p.update(i % 2, *r, "t", *r > 0.0).is_ok());
        }
        for w in p.weights() {
            prop_assert!(*w >= 0.1);
        }
    }

    #[test]
    fn positive_streak_is_linear(n in 1usize..50, reward in 0.0..2.0f64) {
        let mut p = policy(1, 0);
        for _ in 0..n {
            prop_assert!(p.update(0, reward, "t", true).is_ok());
        }
        #[allow(clippy::cast_precision_loss)]
        let expected = 1.0 + n as f64 * 0.1 * reward;
        prop_assert!((p.weight(0).unwrap_or_default() - expected).abs() < 1e-9);
        prop_assert_eq!(p.successful_controllers("t").len(), n);
    }

    #[test]
    fn selection_stays_in_range(pool in 1usize..16, seed in any::<u64>()) {
        let mut p = policy(pool, seed);
        let ctx = SelectionContext::new("t");
        for mode in SelectionMode::ALL {
            let i = p.select(mode, ctx);
            prop_assert!(matches!(i, Ok(i) if i < pool));
        }
    }
}
