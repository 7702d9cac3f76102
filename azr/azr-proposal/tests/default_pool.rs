//! The built-in controller pool runs in the kinematic mock.
//!
//! Run with: cargo test -p azr-proposal --test default_pool

use azr_policy::{PolicyConfig, SelectionMode};
use azr_proposal::{MockProposalSource, ProposalConfig, ProposalSource};
use azr_sim::{ControllerScript, MockSimulator, SimulationConfig, SimulationExecutor};
use azr_types::{Difficulty, LearningContext, TaskParameters};

fn source() -> MockProposalSource {
    let config = ProposalConfig::default()
        .with_controller_selection(SelectionMode::Sequential)
        .with_seed(23);
    MockProposalSource::new(config, PolicyConfig::default()).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn every_generated_script_compiles() {
    let mut src = source();
    for difficulty in Difficulty::ALL {
        let ctx = LearningContext::fresh(difficulty);
        for _ in 0..src.controllers().len() {
            let task = src.propose_task(&ctx).unwrap_or_else(|e| panic!("{e}"));
            let artifact = src.generate_controller_code(&task).unwrap_or_else(|e| panic!("{e}"));
            let script = ControllerScript::parse(&artifact.code).unwrap_or_else(|e| panic!("{e}"));
            assert_eq!(
                script.metadata.get("task_id").map(String::as_str),
                Some(task.task_id.as_str())
            );
            assert!(script.compile(0.01).is_ok(), "controller {} rejected", artifact.index);
        }
    }
}

#[test]
fn default_pool_succeeds_on_every_template() {
    let mut src = source();
    let mut sim = MockSimulator::new(SimulationConfig::default().with_seed(4)).unwrap_or_else(|e| panic!("{e}"));
    assert!(sim.initialize().is_ok());

    let ctx = LearningContext::fresh(Difficulty::Medium);
    let spare = TaskParameters::new("spare", "advance the controller cycle", "reaching", Difficulty::Easy);
    let mut outcomes = Vec::new();
    for round in 0..9 {
        // Shift the controller cycle against the task cycle so all nine
        // pairings are exercised.
        if round == 3 || round == 6 {
            assert!(src.generate_controller_code(&spare).is_ok());
        }
        let task = src.propose_task(&ctx).unwrap_or_else(|e| panic!("{e}"));
        let artifact = src.generate_controller_code(&task).unwrap_or_else(|e| panic!("{e}"));
        let result = sim.execute(&task, &artifact.code).unwrap_or_else(|e| panic!("{e}"));
        outcomes.push((task.task_type.clone(), artifact.index, result.success));
    }
    assert!(outcomes.iter().all(|(_, _, ok)| *ok), "{outcomes:?}");
}
