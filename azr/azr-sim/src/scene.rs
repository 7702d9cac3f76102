//! Kinematic mock scene with domain randomization.
//!
//! The scene moves a point end effector by the commanded displacement,
//! scaled by a friction response and the randomized mass factor. Objects
//! only move while grasped. Gravity is sampled and reported but does not
//! act on the kinematics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use azr_types::{AzrError, ObjectKind, ParamRange, Result, TaskParameters};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimulationConfig;
use crate::robot::RobotHandle;
use crate::world::{ObjectState, WorldState};

/// Distance within which a closed gripper picks up an object.
pub const GRASP_RADIUS: f64 = 0.05;

/// Physical parameters in effect for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Gravity vector (m/s²).
    pub gravity: Vector3<f64>,
    /// Surface friction coefficient.
    pub friction: f64,
    /// Multiplier on object and arm mass.
    pub mass_factor: f64,
    /// Relative actuation noise.
    pub actuation_noise: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, 0.0, -9.81),
            friction: 0.7,
            mass_factor: 1.0,
            actuation_noise: 0.0,
        }
    }
}

impl PhysicsParams {
    /// Fraction of a commanded displacement that is realized.
    ///
    /// Higher friction and heavier payloads both slow the end effector.
    #[must_use]
    pub fn response(&self) -> f64 {
        (1.0 - 0.3 * self.friction).clamp(0.5, 1.0) / self.mass_factor
    }
}

/// Named friction presets used by task randomization labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrictionLevel {
    /// Slippery surfaces.
    Low,
    /// Typical surfaces.
    Medium,
    /// Grippy surfaces.
    High,
    /// Sampled from the configured friction range.
    Random,
}

impl FrictionLevel {
    /// Friction coefficient for this level.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::InvalidTask`] if `Random` is drawn from an
    /// invalid range.
    pub fn sample(self, range: ParamRange, rng: &mut impl Rng) -> Result<f64> {
        match self {
            Self::Low => Ok(0.3),
            Self::Medium => Ok(0.6),
            Self::High => Ok(0.9),
            Self::Random => sample_range("friction_range", range, rng),
        }
    }

    /// Label name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for FrictionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrictionLevel {
    type Err = AzrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "random" => Ok(Self::Random),
            other => Err(AzrError::invalid_task(format!(
                "unknown friction level '{other}' (expected low, medium, high or random)"
            ))),
        }
    }
}

/// Draws uniformly from `range`.
///
/// Ranges whose width is not representable are rejected rather than sampled.
fn sample_range(name: &str, range: ParamRange, rng: &mut impl Rng) -> Result<f64> {
    if !range.is_valid() {
        return Err(AzrError::invalid_task(format!(
            "randomization range '{name}' is not a valid [min, max] pair ({}, {})",
            range.min, range.max
        )));
    }
    if range.width() <= 0.0 {
        Ok(range.min)
    } else {
        Ok(rng.gen_range(range.min..=range.max))
    }
}

/// A task instantiated in the kinematic mock.
#[derive(Debug, Clone)]
pub struct KinematicScene {
    physics: PhysicsParams,
    objects: Vec<ObjectState>,
    goal: Option<Point3<f64>>,
    target_object: Option<String>,
    sampled: BTreeMap<String, f64>,
    grasped: Option<usize>,
    dt: f64,
    time: f64,
    step: usize,
    rng: StdRng,
}

impl KinematicScene {
    /// Builds the scene for `task`, applying domain randomization.
    ///
    /// Every `[min, max]` range of the task is sampled. `gravity` and
    /// `friction` override the scene-wide values, `*_mass` ranges scale
    /// the mass factor relative to their midpoint, and `*_positions`
    /// ranges jitter objects whose name starts with the prefix. The
    /// `friction_level` label selects a [`FrictionLevel`].
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::InvalidTask`] for an invalid range, a
    /// non-positive mass range or an unknown friction level.
    pub fn from_task(task: &TaskParameters, config: &SimulationConfig, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut objects: Vec<ObjectState> = task
            .scene_config
            .objects
            .iter()
            .map(|o| ObjectState {
                name: o.name.clone(),
                kind: o.kind,
                position: Point3::from(o.position),
            })
            .collect();

        let mut physics = PhysicsParams::default();
        let mut sampled = BTreeMap::new();
        let dr = &config.domain_randomization;

        if dr.enabled {
            physics.gravity.z = sample_range("gravity_range", dr.gravity_range, &mut rng)?;
            physics.friction = sample_range("friction_range", dr.friction_range, &mut rng)?;
            physics.mass_factor =
                sample_range("mass_range_factor", dr.mass_range_factor, &mut rng)?;
            physics.actuation_noise = dr.actuation_noise;

            for (name, range) in &task.domain_randomization.ranges {
                let value = sample_range(name, *range, &mut rng)?;
                sampled.insert(name.clone(), value);

                if name == "gravity" {
                    physics.gravity.z = value;
                } else if name == "friction" {
                    physics.friction = value;
                } else if name.ends_with("_mass") {
                    if range.min <= 0.0 {
                        return Err(AzrError::invalid_task(format!(
                            "mass range '{name}' must be positive"
                        )));
                    }
                    physics.mass_factor *= value / range.midpoint();
                } else if let Some(prefix) = name.strip_suffix("_positions") {
                    let offset = value.abs();
                    let jitter = ParamRange::new(-offset, offset);
                    for object in objects.iter_mut().filter(|o| o.name.starts_with(prefix)) {
                        object.position.x += sample_range(name, jitter, &mut rng)?;
                        object.position.y += sample_range(name, jitter, &mut rng)?;
                    }
                }
            }

            if let Some(label) = task.domain_randomization.labels.get("friction_level") {
                let level: FrictionLevel = label.parse()?;
                physics.friction = level.sample(dr.friction_range, &mut rng)?;
            }

            debug!(
                task_id = %task.task_id,
                gravity = physics.gravity.z,
                friction = physics.friction,
                mass_factor = physics.mass_factor,
                ?sampled,
                "applied domain randomization"
            );
        } else {
            debug!(task_id = %task.task_id, "domain randomization disabled, using nominal physics");
        }

        Ok(Self {
            physics,
            objects,
            goal: task.robot_goal.target_position.map(Point3::from),
            target_object: task.robot_goal.target_object.clone(),
            sampled,
            grasped: None,
            dt: config.physics_dt,
            time: 0.0,
            step: 0,
            rng,
        })
    }

    /// Physics in effect.
    #[must_use]
    pub const fn physics(&self) -> &PhysicsParams {
        &self.physics
    }

    /// Values drawn for each task randomization range.
    #[must_use]
    pub const fn sampled_parameters(&self) -> &BTreeMap<String, f64> {
        &self.sampled
    }

    /// Simulated time (seconds).
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Steps advanced so far.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.step
    }

    /// Name of the object currently held, if any.
    #[must_use]
    pub fn grasped_object(&self) -> Option<&str> {
        self.grasped.map(|i| self.objects[i].name.as_str())
    }

    /// Current world snapshot.
    #[must_use]
    pub fn snapshot(&self) -> WorldState {
        WorldState {
            time: self.time,
            step: self.step,
            gravity: self.physics.gravity,
            goal: self.goal,
            target_object: self.target_object.clone(),
            objects: self.objects.clone(),
        }
    }

    /// Advances one timestep, consuming the robot's queued command.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::ControllerExecution`] if the command is not
    /// finite.
    pub fn advance(&mut self, robot: &mut RobotHandle) -> Result<()> {
        self.update_grasp(robot);

        match robot.take_action() {
            Some(action) if !action.iter().all(|c| c.is_finite()) => {
                return Err(AzrError::controller_execution(format!(
                    "non-finite action at step {}",
                    self.step
                )));
            }
            Some(action) => {
                let response = self.physics.response();
                let noise = self.physics.actuation_noise;
                let displacement = action.map(|c| {
                    let jitter = if noise > 0.0 {
                        1.0 + self.rng.gen_range(-noise..=noise)
                    } else {
                        1.0
                    };
                    c * response * jitter
                });
                robot.move_to(robot.end_effector_position() + displacement, self.dt);
            }
            None => robot.hold(),
        }

        if let Some(i) = self.grasped {
            self.objects[i].position = robot.end_effector_position();
        }

        self.time += self.dt;
        self.step += 1;
        Ok(())
    }

    fn update_grasp(&mut self, robot: &RobotHandle) {
        if !robot.is_grasping() {
            self.grasped = None;
            return;
        }
        if self.grasped.is_some() {
            return;
        }
        let effector = robot.end_effector_position();
        self.grasped = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, o)| matches!(o.kind, ObjectKind::Box | ObjectKind::Sphere))
            .map(|(i, o)| (i, (o.position - effector).norm()))
            .filter(|(_, d)| *d <= GRASP_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
    }
}
