//! Property-based tests for domain randomization over arbitrary finite ranges.
//!
//! Run with: cargo test -p azr-sim --test randomization_properties

use azr_sim::{KinematicScene, SimulationConfig};
use azr_types::{
    AzrError, Difficulty, DomainRandomization, ObjectKind, SceneObject, TaskParameters,
};
use proptest::prelude::*;

fn arb_finite() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE
        | prop::num::f64::NEGATIVE
        | prop::num::f64::NORMAL
        | prop::num::f64::SUBNORMAL
        | prop::num::f64::ZERO
}

fn arb_parameter() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["gravity", "friction", "cube_mass", "cube_positions", "stiffness"])
}

fn task_with_range(name: &str, min: f64, max: f64, factor: f64) -> TaskParameters {
    let mut task = TaskParameters::new("t", "randomized", "pick_and_place", Difficulty::Medium)
        .with_target([0.3, 0.3, 0.05])
        .with_object(SceneObject::new("cube", ObjectKind::Box, [0.0, 0.0, 0.0]));
    task.domain_randomization = DomainRandomization::default()
        .with_range(name, min, max)
        .scaled(factor);
    task
}

proptest! {
    #[test]
    fn validation_never_panics(
        name in arb_parameter(),
        a in arb_finite(),
        b in arb_finite(),
        factor in prop::sample::select(vec![0.5, 1.0, 1.5]),
    ) {
        let task = task_with_range(name, a.min(b), a.max(b), factor);
        let result = task.validate();
        prop_assert!(result.is_ok() || matches!(result, Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn scene_construction_never_panics(
        name in arb_parameter(),
        a in arb_finite(),
        b in arb_finite(),
        factor in prop::sample::select(vec![0.5, 1.0, 1.5]),
        seed in any::<u64>(),
    ) {
        let task = task_with_range(name, a.min(b), a.max(b), factor);
        let scene = KinematicScene::from_task(&task, &SimulationConfig::default(), seed);
        prop_assert!(
            scene.is_ok() || matches!(scene, Err(AzrError::InvalidTask(_))),
            "unexpected error: {:?}",
            scene.err()
        );
    }

    #[test]
    fn unordered_ranges_are_rejected(a in arb_finite(), b in arb_finite()) {
        prop_assume!(a != b);
        let task = task_with_range("friction", a.max(b), a.min(b), 1.0);
        let scene = KinematicScene::from_task(&task, &SimulationConfig::default(), 0);
        prop_assert!(matches!(scene, Err(AzrError::InvalidTask(_))));
    }
}
