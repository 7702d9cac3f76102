//! Simulation executor for the GROOTZERO learning loop.
//!
//! This crate defines the [`SimulationExecutor`] contract and two
//! implementations:
//!
//! - [`MockSimulator`] - Kinematic mock that compiles controller scripts and
//!   runs them in a sandbox
//! - [`ScriptedExecutor`] - Deterministic test double replaying fixed outcomes
//!
//! # Controller code
//!
//! Controller code is a TOML [`ControllerScript`] naming a control law
//! (`proportional`, `proportional_derivative`, `waypoint`) and its
//! parameters. Compiling yields a boxed [`Controller`] whose only entry
//! point, [`Controller::step`], receives a [`RobotHandle`] and a
//! [`WorldState`] snapshot and returns a
//! [`ControllerStatus`](azr_types::ControllerStatus).
//!
//! # Sandbox
//!
//! [`run_sandboxed`] bounds a run by [`SandboxLimits`]: a step budget and a
//! wall-clock timeout checked between steps. Panics inside a step are
//! caught and end the run.
//!
//! # Example
//!
//! ```
//! use azr_sim::{MockSimulator, SimulationConfig, SimulationExecutor};
//! use azr_types::{Difficulty, TaskParameters};
//!
//! let mut sim = MockSimulator::new(SimulationConfig::default().with_seed(5))
//!     .unwrap_or_else(|e| panic!("{e}"));
//! sim.initialize().unwrap_or_default();
//!
//! let task = TaskParameters::new("t", "reach the marker", "reaching", Difficulty::Medium)
//!     .with_target([0.3, 0.3, 0.05]);
//! let code = "kind = \"proportional_derivative\"\ngain = 0.2\n";
//! let result = sim.execute(&task, code).unwrap_or_default();
//! assert!(result.success);
//! assert!(result.metrics.steps_to_completion.is_some());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod config;
mod controller;
mod executor;
mod robot;
mod sandbox;
mod scene;
mod script;
mod scripted;
mod world;

pub use config::{RandomizationConfig, SimulationConfig};
pub use controller::{Controller, PdController, ProportionalController, WaypointController};
pub use executor::{MockSimulator, SimulationExecutor};
pub use robot::RobotHandle;
pub use sandbox::{SandboxLimits, SandboxReport, StopCause, run_sandboxed};
pub use scene::{FrictionLevel, GRASP_RADIUS, KinematicScene, PhysicsParams};
pub use script::{ControllerKind, ControllerScript, compile_controller};
pub use scripted::{ScriptedExecutor, ScriptedOutcome};
pub use world::{ObjectState, WorldState};
