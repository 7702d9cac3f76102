//! Learning loop orchestration for GROOTZERO.
//!
//! Ties the proposal source, the simulation executor, the reward calculator
//! and the difficulty schedule into the self-play loop:
//!
//! 1. Propose a task for the current difficulty
//! 2. Generate controller code (the proposal source consults its selection policy)
//! 3. Execute the controller in simulation
//! 4. Compute the reward and evaluate the run
//! 5. Feed the reward back, record history, adjust difficulty
//!
//! # Components
//!
//! - [`GrootzeroConfig`] - TOML run configuration with required-key checking
//! - [`LearningLoop`] - The orchestrator and its [`LoopPhase`] state machine
//! - [`DifficultySchedule`] - Rolling success-rate difficulty adjustment
//! - [`logging`] - Subscriber setup for the binary
//!
//! # Example
//!
//! ```
//! use azr_loop::{GrootzeroConfig, StopReason, build_mock_loop};
//!
//! let config = GrootzeroConfig::default().with_seed(42);
//! let mut lp = build_mock_loop(&config).unwrap_or_else(|e| panic!("{e}"));
//! let summary = lp.run(Some(3)).unwrap_or_else(|e| panic!("{e}"));
//! assert_eq!(summary.episodes(), 3);
//! assert_eq!(summary.stop_reason, StopReason::BudgetExhausted);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod config;
mod difficulty;
pub mod logging;
mod orchestrator;

pub use config::{AzrConfig, GrootzeroConfig, LearningConfig, MAX_EPISODE_CEILING, REQUIRED_KEYS};
pub use difficulty::DifficultySchedule;
pub use orchestrator::{
    AbortedEpisode, CancelToken, EpisodeOutcome, LearningLoop, LoopPhase, RunSummary, StopReason,
};

use azr_proposal::MockProposalSource;
use azr_sim::MockSimulator;
use azr_types::Result;

/// A loop over the mock proposal source and the kinematic simulator.
pub type MockLearningLoop = LearningLoop<MockProposalSource, MockSimulator>;

/// Builds a loop over the mock collaborators described by `config`.
///
/// # Errors
///
/// Returns [`azr_types::AzrError::Configuration`] for an invalid configuration.
pub fn build_mock_loop(config: &GrootzeroConfig) -> Result<MockLearningLoop> {
    let source = MockProposalSource::new(config.groot_n1.clone(), config.policy_config())?;
    let simulator = MockSimulator::new(config.simulation.clone())?;
    LearningLoop::new(source, simulator, config)
}
