//! Robot handle exposed to controller code.

use nalgebra::{Point3, Vector3};

/// The only mutable surface a controller can touch.
///
/// Controllers read the end-effector state and queue one displacement
/// command per step with [`apply_action`](Self::apply_action). The scene
/// consumes the command when it advances; the handle records the
/// trajectory and the commanded effort for the efficiency metrics.
///
/// # Example
///
/// ```
/// use azr_sim::RobotHandle;
/// use nalgebra::{Point3, Vector3};
///
/// let mut robot = RobotHandle::new("arm", "ur10", Point3::origin());
/// robot.apply_action(Vector3::new(0.1, 0.0, 0.0));
/// assert!(robot.pending_action().is_some());
/// assert!((robot.path_efficiency() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct RobotHandle {
    name: String,
    robot_type: String,
    position: Point3<f64>,
    velocity: Vector3<f64>,
    pending: Option<Vector3<f64>>,
    grasping: bool,
    trajectory: Vec<Point3<f64>>,
    effort: f64,
}

impl RobotHandle {
    /// Creates a handle with the end effector at `position`.
    #[must_use]
    pub fn new(name: impl Into<String>, robot_type: impl Into<String>, position: Point3<f64>) -> Self {
        Self {
            name: name.into(),
            robot_type: robot_type.into(),
            position,
            velocity: Vector3::zeros(),
            pending: None,
            grasping: false,
            trajectory: vec![position],
            effort: 0.0,
        }
    }

    /// Robot instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Robot model, e.g. `ur10`.
    #[must_use]
    pub fn robot_type(&self) -> &str {
        &self.robot_type
    }

    /// Current end-effector position.
    #[must_use]
    pub const fn end_effector_position(&self) -> Point3<f64> {
        self.position
    }

    /// End-effector velocity over the last step.
    #[must_use]
    pub const fn end_effector_velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Queues a displacement command for the next step.
    ///
    /// A second call within the same step replaces the first.
    pub fn apply_action(&mut self, action: Vector3<f64>) {
        self.pending = Some(action);
    }

    /// The command queued for the next step.
    #[must_use]
    pub const fn pending_action(&self) -> Option<Vector3<f64>> {
        self.pending
    }

    /// Closes the gripper.
    pub fn grasp(&mut self) {
        self.grasping = true;
    }

    /// Opens the gripper.
    pub fn release(&mut self) {
        self.grasping = false;
    }

    /// Returns true while the gripper is closed.
    #[must_use]
    pub const fn is_grasping(&self) -> bool {
        self.grasping
    }

    /// Every end-effector position visited, starting with the initial one.
    #[must_use]
    pub fn trajectory(&self) -> &[Point3<f64>] {
        &self.trajectory
    }

    /// Straight-line distance over travelled distance, in [0, 1].
    ///
    /// Returns 1.0 when the end effector never moved.
    #[must_use]
    pub fn path_efficiency(&self) -> f64 {
        let (Some(start), Some(end)) = (self.trajectory.first(), self.trajectory.last()) else {
            return 1.0;
        };
        let travelled: f64 = self
            .trajectory
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        if travelled <= f64::EPSILON {
            return 1.0;
        }
        ((end - start).norm() / travelled).clamp(0.0, 1.0)
    }

    /// `1 / (1 + Σ|action|²)` over every consumed command.
    #[must_use]
    pub fn energy_efficiency(&self) -> f64 {
        1.0 / (1.0 + self.effort)
    }

    /// Takes the queued command, charging its effort.
    pub(crate) fn take_action(&mut self) -> Option<Vector3<f64>> {
        let action = self.pending.take()?;
        self.effort += action.norm_squared();
        Some(action)
    }

    /// Moves the end effector and records the new position.
    pub(crate) fn move_to(&mut self, position: Point3<f64>, dt: f64) {
        self.velocity = if dt > 0.0 {
            (position - self.position) / dt
        } else {
            Vector3::zeros()
        };
        self.position = position;
        self.trajectory.push(position);
    }

    /// Zeroes the velocity for a step without motion.
    pub(crate) fn hold(&mut self) {
        self.velocity = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straight_path_is_fully_efficient() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        for i in 1..=4 {
            robot.move_to(Point3::new(f64::from(i) * 0.1, 0.0, 0.0), 0.01);
        }
        assert_relative_eq!(robot.path_efficiency(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn detour_lowers_path_efficiency() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        robot.move_to(Point3::new(0.0, 1.0, 0.0), 0.01);
        robot.move_to(Point3::new(1.0, 1.0, 0.0), 0.01);
        robot.move_to(Point3::new(1.0, 0.0, 0.0), 0.01);
        assert_relative_eq!(robot.path_efficiency(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn round_trip_has_zero_path_efficiency() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        robot.move_to(Point3::new(0.5, 0.0, 0.0), 0.01);
        robot.move_to(Point3::origin(), 0.01);
        assert_relative_eq!(robot.path_efficiency(), 0.0);
    }

    #[test]
    fn energy_efficiency_accumulates_effort() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        assert_relative_eq!(robot.energy_efficiency(), 1.0);

        robot.apply_action(Vector3::new(1.0, 0.0, 0.0));
        assert!(robot.take_action().is_some());
        assert_relative_eq!(robot.energy_efficiency(), 0.5);

        // no pending command, no charge
        assert!(robot.take_action().is_none());
        assert_relative_eq!(robot.energy_efficiency(), 0.5);
    }

    #[test]
    fn velocity_tracks_last_move() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        robot.move_to(Point3::new(0.02, 0.0, 0.0), 0.01);
        assert_relative_eq!(robot.end_effector_velocity().x, 2.0, epsilon = 1e-12);
        robot.hold();
        assert_relative_eq!(robot.end_effector_velocity().norm(), 0.0);
    }

    #[test]
    fn gripper_toggles() {
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        robot.grasp();
        assert!(robot.is_grasping());
        robot.release();
        assert!(!robot.is_grasping());
    }
}
