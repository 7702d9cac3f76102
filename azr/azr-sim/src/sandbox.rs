//! Bounded execution of untrusted controller logic.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use azr_types::ControllerStatus;
use tracing::{debug, warn};

use crate::controller::Controller;
use crate::robot::RobotHandle;
use crate::scene::KinematicScene;

/// Budget for one controller run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    /// Maximum controller steps.
    pub max_steps: usize,
    /// Maximum wall-clock time, checked between steps.
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            timeout: Duration::from_secs(5),
        }
    }
}

impl SandboxLimits {
    /// Creates limits.
    #[must_use]
    pub const fn new(max_steps: usize, timeout: Duration) -> Self {
        Self { max_steps, timeout }
    }
}

/// Why a controller run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// The controller reported success.
    Completed,
    /// The controller reported failure.
    ControllerFailed,
    /// The step budget ran out.
    StepLimit,
    /// The wall-clock budget ran out.
    Timeout,
    /// The controller panicked.
    Panicked(String),
    /// The scene rejected the controller's command.
    Rejected(String),
}

impl StopCause {
    /// Returns true if the run ended in success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the controller misbehaved rather than just failing the task.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Panicked(_) | Self::Rejected(_))
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::ControllerFailed => f.write_str("controller reported failure"),
            Self::StepLimit => f.write_str("step limit reached"),
            Self::Timeout => f.write_str("wall-clock timeout"),
            Self::Panicked(msg) => write!(f, "controller panicked: {msg}"),
            Self::Rejected(msg) => write!(f, "action rejected: {msg}"),
        }
    }
}

/// Outcome of a sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxReport {
    /// Why the run ended.
    pub cause: StopCause,
    /// Steps the scene advanced.
    pub steps: usize,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Runs `controller` against `scene` until it terminates or a limit trips.
///
/// Each step is isolated with [`catch_unwind`]; a panic ends the run with
/// [`StopCause::Panicked`] and leaves the caller intact.
pub fn run_sandboxed(
    controller: &mut dyn Controller,
    robot: &mut RobotHandle,
    scene: &mut KinematicScene,
    limits: SandboxLimits,
) -> SandboxReport {
    let start = Instant::now();
    let report = |cause, scene: &KinematicScene| SandboxReport {
        cause,
        steps: scene.step_count(),
        elapsed: start.elapsed(),
    };

    while scene.step_count() < limits.max_steps {
        if start.elapsed() > limits.timeout {
            warn!(controller = controller.name(), steps = scene.step_count(), "controller timed out");
            return report(StopCause::Timeout, scene);
        }

        let world = scene.snapshot();
        let status = catch_unwind(AssertUnwindSafe(|| controller.step(robot, &world)));
        match status {
            Ok(ControllerStatus::Success) => {
                debug!(controller = controller.name(), steps = scene.step_count(), "controller succeeded");
                return report(StopCause::Completed, scene);
            }
            Ok(ControllerStatus::Failure) => {
                debug!(controller = controller.name(), steps = scene.step_count(), "controller failed");
                return report(StopCause::ControllerFailed, scene);
            }
            Ok(ControllerStatus::Running) => {}
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(controller = controller.name(), steps = scene.step_count(), %msg, "controller panicked");
                return report(StopCause::Panicked(msg), scene);
            }
        }

        if let Err(e) = scene.advance(robot) {
            warn!(controller = controller.name(), error = %e, "scene rejected controller action");
            return report(StopCause::Rejected(e.to_string()), scene);
        }
    }

    debug!(controller = controller.name(), max_steps = limits.max_steps, "step limit reached");
    report(StopCause::StepLimit, scene)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
