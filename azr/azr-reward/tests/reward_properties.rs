//! Property-based tests for reward shaping.
//!
//! Run with: cargo test -p azr-reward --test reward_properties

use azr_reward::{MetricPolicy, RewardCalculator, calculate_reward, normalize_reward};
use azr_types::{Difficulty, ExecutionMetrics, ExecutionResult};
use proptest::prelude::*;

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn arb_result() -> impl Strategy<Value = ExecutionResult> {
    (any::<bool>(), 0.0..500.0f64, -1.0..2.0f64, -1.0..2.0f64).prop_map(
        |(success, time, path, energy)| ExecutionResult {
            success,
            metrics: ExecutionMetrics::new(time, path, energy),
            failure_reason: None,
        },
    )
}

proptest! {
    #[test]
    fn normalized_reward_is_bounded(raw in -1.0e6..1.0e6f64) {
        let n = normalize_reward(raw);
        prop_assert!((-1.0..=1.0).contains(&n));
    }

    #[test]
    fn normalized_reward_is_monotone(a in -50.0..50.0f64, b in -50.0..50.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(normalize_reward(lo) <= normalize_reward(hi));
    }

    #[test]
    fn reward_stays_within_envelope(result in arb_result(), level in arb_difficulty()) {
        let reward = calculate_reward(&result, level);
        prop_assert!(reward.is_ok());
        let reward = reward.unwrap_or_default();
        let m = level.multiplier();
        if result.success {
            prop_assert!(reward >= 1.0 * m - 1e-12);
            prop_assert!(reward <= 2.0 * m + 1e-12);
        } else {
            prop_assert!((reward + m).abs() < 1e-12);
        }
    }

    #[test]
    fn reward_is_deterministic(result in arb_result(), level in arb_difficulty()) {
        let calc = RewardCalculator::new(MetricPolicy::DefaultToZero);
        let a = calc.calculate(&result, level).unwrap_or_default();
        let b = calc.calculate(&result, level).unwrap_or_default();
        prop_assert_eq!(a.to_bits(), b.to_bits());
    }
}
