//! The simulation executor contract and the kinematic mock simulator.

use azr_types::{AzrError, ExecutionMetrics, ExecutionResult, Result, TaskParameters};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::robot::RobotHandle;
use crate::sandbox::{SandboxLimits, StopCause, run_sandboxed};
use crate::scene::KinematicScene;
use crate::script::compile_controller;

/// Runs controller code against a task.
///
/// Implementations are swappable behind this trait; the learning loop
/// never inspects which one it holds.
pub trait SimulationExecutor {
    /// Prepares the simulator. Calling it twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if the simulator cannot start.
    fn initialize(&mut self) -> Result<()>;

    /// Executes `code` against `task`.
    ///
    /// A controller that runs but does not achieve the task yields
    /// `Ok` with `success == false`.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::ControllerExecution`] when the code cannot be
    /// compiled or faults while running, and [`AzrError::InvalidTask`]
    /// when the task cannot be instantiated.
    fn execute(&mut self, task: &TaskParameters, code: &str) -> Result<ExecutionResult>;

    /// Releases simulator resources.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    fn close(&mut self) -> Result<()>;
}

/// Kinematic mock of a physics simulator.
///
/// Each execution builds a fresh [`KinematicScene`] from the task, compiles
/// the controller script and runs it under [`SandboxLimits`] derived from
/// the configuration. Time to completion is simulated time, so results
/// are reproducible for a fixed seed.
///
/// # Example
///
/// ```
/// use azr_sim::{MockSimulator, SimulationConfig, SimulationExecutor};
/// use azr_types::{Difficulty, TaskParameters};
///
/// let mut sim = MockSimulator::new(SimulationConfig::default().with_seed(3))
///     .unwrap_or_else(|e| panic!("{e}"));
/// sim.initialize().unwrap_or_default();
///
/// let task = TaskParameters::new("t", "reach", "reaching", Difficulty::Easy)
///     .with_target([0.2, 0.1, 0.0]);
/// let result = sim.execute(&task, "kind = \"proportional\"\n");
/// assert!(result.is_ok_and(|r| r.success));
/// ```
#[derive(Debug)]
pub struct MockSimulator {
    config: SimulationConfig,
    rng: StdRng,
    initialized: bool,
    executions: usize,
}

impl MockSimulator {
    /// Creates a simulator.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if `config` is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            config,
            rng,
            initialized: false,
            executions: 0,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns true between `initialize` and `close`.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Executions performed so far.
    #[must_use]
    pub const fn executions(&self) -> usize {
        self.executions
    }

    fn limits(&self) -> SandboxLimits {
        SandboxLimits::new(self.config.max_steps, self.config.timeout())
    }
}

impl SimulationExecutor for MockSimulator {
    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            warn!("simulation already initialized");
            return Ok(());
        }
        info!(
            environment = %self.config.environment_path,
            physics_dt = self.config.physics_dt,
            max_steps = self.config.max_steps,
            "initialized kinematic mock simulator"
        );
        self.initialized = true;
        Ok(())
    }

    fn execute(&mut self, task: &TaskParameters, code: &str) -> Result<ExecutionResult> {
        if !self.initialized {
            return Err(AzrError::configuration("simulation used before initialize()"));
        }
        self.executions += 1;

        let mut scene = KinematicScene::from_task(task, &self.config, self.rng.next_u64())?;
        let mut controller = compile_controller(code, self.config.physics_dt)?;
        let mut robot = RobotHandle::new(
            task.robot.name.clone(),
            task.robot.robot_type.clone(),
            Point3::from(task.robot.position),
        );

        debug!(
            task_id = %task.task_id,
            robot = %task.robot.name,
            robot_type = %task.robot.robot_type,
            controller = controller.name(),
            "running controller"
        );
        let report = run_sandboxed(controller.as_mut(), &mut robot, &mut scene, self.limits());

        if report.cause.is_fault() {
            return Err(AzrError::controller_execution(format!(
                "controller '{}' faulted on task {}: {}",
                controller.name(),
                task.task_id,
                report.cause
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let simulated_time = report.steps as f64 * self.config.physics_dt;
        let metrics = ExecutionMetrics::new(
            simulated_time,
            robot.path_efficiency(),
            robot.energy_efficiency(),
        )
        .with_steps(report.steps);

        info!(
            task_id = %task.task_id,
            success = report.cause.is_success(),
            steps = report.steps,
            cause = %report.cause,
            "controller execution completed"
        );

        Ok(match report.cause {
            StopCause::Completed => ExecutionResult::succeeded(metrics),
            cause => ExecutionResult::unsuccessful(metrics).with_failure_reason(cause.to_string()),
        })
    }

    fn close(&mut self) -> Result<()> {
        if self.initialized {
            info!(executions = self.executions, "closed kinematic mock simulator");
        }
        self.initialized = false;
        Ok(())
    }
}
