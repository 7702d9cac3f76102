//! Controller trait and the built-in control laws.

use azr_types::ControllerStatus;
use nalgebra::Point3;

use crate::robot::RobotHandle;
use crate::world::WorldState;

/// Compiled controller logic.
///
/// `step` is the single entry point. It sees only the robot handle and a
/// world snapshot, queues at most one action on the handle, and reports
/// whether the task is done.
pub trait Controller {
    /// Human-readable controller name.
    fn name(&self) -> &str;

    /// Runs one control step.
    fn step(&mut self, robot: &mut RobotHandle, world: &WorldState) -> ControllerStatus;
}

/// Resolves the point a controller should drive toward.
fn goal_of(target: Option<Point3<f64>>, world: &WorldState) -> Option<Point3<f64>> {
    target.or(world.goal)
}

/// Proportional position controller.
#[derive(Debug, Clone)]
pub struct ProportionalController {
    name: String,
    target: Option<Point3<f64>>,
    gain: f64,
    tolerance: f64,
}

impl ProportionalController {
    /// Creates a controller. A `None` target falls back to the task goal.
    #[must_use]
    pub fn new(name: impl Into<String>, target: Option<Point3<f64>>, gain: f64, tolerance: f64) -> Self {
        Self {
            name: name.into(),
            target,
            gain,
            tolerance,
        }
    }
}

impl Controller for ProportionalController {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, robot: &mut RobotHandle, world: &WorldState) -> ControllerStatus {
        let Some(target) = goal_of(self.target, world) else {
            return ControllerStatus::Failure;
        };
        let error = target - robot.end_effector_position();
        if error.norm() < self.tolerance {
            return ControllerStatus::Success;
        }
        robot.apply_action(error * self.gain);
        ControllerStatus::Running
    }
}

/// Proportional-derivative position controller.
#[derive(Debug, Clone)]
pub struct PdController {
    name: String,
    target: Option<Point3<f64>>,
    gain: f64,
    derivative_gain: f64,
    tolerance: f64,
    dt: f64,
}

impl PdController {
    /// Creates a controller. `dt` converts velocity into a per-step damping term.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target: Option<Point3<f64>>,
        gain: f64,
        derivative_gain: f64,
        tolerance: f64,
        dt: f64,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            gain,
            derivative_gain,
            tolerance,
            dt,
        }
    }
}

impl Controller for PdController {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, robot: &mut RobotHandle, world: &WorldState) -> ControllerStatus {
        let Some(target) = goal_of(self.target, world) else {
            return ControllerStatus::Failure;
        };
        let error = target - robot.end_effector_position();
        if error.norm() < self.tolerance {
            return ControllerStatus::Success;
        }
        let damping = robot.end_effector_velocity() * (self.derivative_gain * self.dt);
        robot.apply_action(error * self.gain - damping);
        ControllerStatus::Running
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WaypointAction {
    Move,
    Grasp,
    Release,
}

#[derive(Debug, Clone, Copy)]
struct Waypoint {
    position: Point3<f64>,
    action: WaypointAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Executing,
    Done,
    Failed,
}

/// Pick-and-place state machine.
///
/// Plans approach, grasp, lift, carry and release waypoints around the
/// target object, then tracks them with a proportional law. When the
/// object is absent from the scene it drives straight to the goal. A
/// waypoint that is not reached within `timeout_steps` fails the run.
#[derive(Debug, Clone)]
pub struct WaypointController {
    name: String,
    target: Option<Point3<f64>>,
    object: Option<String>,
    gain: f64,
    tolerance: f64,
    approach_height: f64,
    timeout_steps: usize,
    phase: Phase,
    waypoints: Vec<Waypoint>,
    current: usize,
    counter: usize,
}

impl WaypointController {
    /// Creates a controller. `object` overrides the task's target object.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target: Option<Point3<f64>>,
        object: Option<String>,
        gain: f64,
        tolerance: f64,
        approach_height: f64,
        timeout_steps: usize,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            object,
            gain,
            tolerance,
            approach_height,
            timeout_steps,
            phase: Phase::Init,
            waypoints: Vec::new(),
            current: 0,
            counter: 0,
        }
    }

    /// Number of planned waypoints (zero before the first step).
    #[must_use]
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    fn plan(&mut self, goal: Point3<f64>, world: &WorldState) {
        let object = self
            .object
            .as_deref()
            .and_then(|name| world.object(name).map(|o| o.position))
            .or_else(|| world.target_object_position());

        let move_to = |position| Waypoint {
            position,
            action: WaypointAction::Move,
        };

        self.waypoints = match object {
            Some(obj) => {
                let above = Point3::new(obj.x, obj.y, obj.z + self.approach_height);
                vec![
                    move_to(above),
                    move_to(obj),
                    Waypoint {
                        position: obj,
                        action: WaypointAction::Grasp,
                    },
                    move_to(above),
                    move_to(goal),
                    Waypoint {
                        position: goal,
                        action: WaypointAction::Release,
                    },
                ]
            }
            None => vec![move_to(goal)],
        };
    }

    fn advance_waypoint(&mut self) {
        self.current += 1;
        self.counter = 0;
    }
}

impl Controller for WaypointController {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, robot: &mut RobotHandle, world: &WorldState) -> ControllerStatus {
        match self.phase {
            Phase::Done => return ControllerStatus::Success,
            Phase::Failed => return ControllerStatus::Failure,
            Phase::Init => {
                let Some(goal) = goal_of(self.target, world) else {
                    self.phase = Phase::Failed;
                    return ControllerStatus::Failure;
                };
                self.plan(goal, world);
                self.phase = Phase::Executing;
                return ControllerStatus::Running;
            }
            Phase::Executing => {}
        }

        let Some(waypoint) = self.waypoints.get(self.current).copied() else {
            self.phase = Phase::Done;
            return ControllerStatus::Success;
        };

        match waypoint.action {
            WaypointAction::Move => {
                let error = waypoint.position - robot.end_effector_position();
                if error.norm() < self.tolerance {
                    self.advance_waypoint();
                    return ControllerStatus::Running;
                }
                robot.apply_action(error * self.gain);
            }
            WaypointAction::Grasp => {
                robot.grasp();
                self.advance_waypoint();
            }
            WaypointAction::Release => {
                robot.release();
                self.advance_waypoint();
            }
        }

        self.counter += 1;
        if self.counter > self.timeout_steps {
            self.phase = Phase::Failed;
            return ControllerStatus::Failure;
        }
        ControllerStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azr_types::ObjectKind;
    use nalgebra::Vector3;

    use crate::world::ObjectState;

    fn world(goal: Option<Point3<f64>>) -> WorldState {
        WorldState {
            time: 0.0,
            step: 0,
            gravity: Vector3::new(0.0, 0.0, -9.81),
            goal,
            target_object: Some("cube".to_string()),
            objects: vec![ObjectState {
                name: "cube".to_string(),
                kind: ObjectKind::Box,
                position: Point3::new(0.1, 0.0, 0.0),
            }],
        }
    }

    #[test]
    fn proportional_succeeds_inside_tolerance() {
        let mut c = ProportionalController::new("p", Some(Point3::new(0.01, 0.0, 0.0)), 0.1, 0.05);
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        assert_eq!(c.step(&mut robot, &world(None)), ControllerStatus::Success);
        assert!(robot.pending_action().is_none());
    }

    #[test]
    fn proportional_commands_scaled_error() {
        let mut c = ProportionalController::new("p", None, 0.1, 0.05);
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        let status = c.step(&mut robot, &world(Some(Point3::new(1.0, 0.0, 0.0))));
        assert_eq!(status, ControllerStatus::Running);
        let dx = robot.pending_action().map_or(0.0, |a| a.x);
        assert!((dx - 0.1).abs() < 1e-12);
    }

    #[test]
    fn missing_goal_fails() {
        let mut c = PdController::new("pd", None, 0.2, 0.05, 0.03, 0.01);
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        assert_eq!(c.step(&mut robot, &world(None)), ControllerStatus::Failure);
    }

    #[test]
    fn waypoint_plans_pick_and_place() {
        let mut c = WaypointController::new("sm", None, None, 0.15, 0.02, 0.1, 1000);
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        let status = c.step(&mut robot, &world(Some(Point3::new(0.3, 0.3, 0.05))));
        assert_eq!(status, ControllerStatus::Running);
        assert_eq!(c.waypoint_count(), 6);
    }

    #[test]
    fn waypoint_without_object_goes_straight() {
        let mut w = world(Some(Point3::new(0.3, 0.0, 0.0)));
        w.target_object = None;
        let mut c = WaypointController::new("sm", None, None, 0.15, 0.02, 0.1, 1000);
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());
        c.step(&mut robot, &w);
        assert_eq!(c.waypoint_count(), 1);
    }

    #[test]
    fn waypoint_times_out_when_robot_is_stuck() {
        let mut c = WaypointController::new("sm", Some(Point3::new(1.0, 0.0, 0.0)), None, 0.15, 0.02, 0.1, 5);
        let mut w = world(None);
        w.target_object = None;
        let mut robot = RobotHandle::new("r", "ur10", Point3::origin());

        // The robot never moves because nothing consumes the actions.
        let statuses: Vec<_> = (0..10).map(|_| c.step(&mut robot, &w)).collect();
        assert!(statuses.contains(&ControllerStatus::Failure));
        assert_eq!(c.step(&mut robot, &w), ControllerStatus::Failure);
    }
}
