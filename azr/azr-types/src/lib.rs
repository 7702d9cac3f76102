//! Core data types for the GROOTZERO self-play learning loop.
//!
//! This crate provides the vocabulary shared by every stage of the loop:
//!
//! - [`TaskParameters`] - A proposed task (scene, robot, goal, randomization)
//! - [`Difficulty`] - Ordered difficulty level with its reward multiplier
//! - [`ExecutionResult`] - Success flag and [`ExecutionMetrics`] from a run
//! - [`ControllerStatus`] - Per-step status returned by controller code
//! - [`Evaluation`] - Qualitative score and feedback
//! - [`LearningEvent`] - One entry of the learning history
//! - [`LearningContext`] - Borrowed view handed to proposal sources
//! - [`AzrError`] - Error taxonomy shared across the workspace
//!
//! # Design Philosophy
//!
//! These types are **pure data**. Rewards, selection, simulation and
//! orchestration live in their own crates and exchange these values.
//!
//! # Example
//!
//! ```
//! use azr_types::{Difficulty, ExecutionMetrics, ExecutionResult, TaskParameters};
//!
//! let task = TaskParameters::new("t-1", "Reach the marker", "reaching", Difficulty::Easy)
//!     .with_target([0.3, 0.0, 0.1]);
//! assert!(task.validate().is_ok());
//!
//! let result = ExecutionResult::succeeded(ExecutionMetrics::new(1.2, 0.95, 0.8));
//! assert!(result.success);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod difficulty;
mod error;
mod execution;
mod history;
mod task;

pub use difficulty::Difficulty;
pub use error::{AzrError, Result};
pub use execution::{ControllerStatus, ExecutionMetrics, ExecutionResult};
pub use history::{Evaluation, LearningContext, LearningEvent};
pub use task::{
    DomainRandomization, ObjectKind, ParamRange, RobotConfig, RobotGoal, SceneConfig,
    SceneObject, TaskParameters,
};
