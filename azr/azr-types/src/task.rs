//! Task parameters produced by a proposal source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AzrError, Difficulty, Result};

/// A fully specified task for one episode.
///
/// Tasks are created by a proposal source and are not modified after they
/// are handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParameters {
    /// Unique identifier.
    pub task_id: String,

    /// Human-readable description.
    pub task_description: String,

    /// Free-form category (e.g. `pick_and_place`).
    pub task_type: String,

    /// Difficulty level.
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Objects to spawn in the scene.
    #[serde(default)]
    pub scene_config: SceneConfig,

    /// Robot to create for the episode.
    #[serde(default)]
    pub robot: RobotConfig,

    /// What the robot must achieve.
    #[serde(default)]
    pub robot_goal: RobotGoal,

    /// Physical parameter ranges to randomize.
    #[serde(default)]
    pub domain_randomization: DomainRandomization,

    /// Description of the success criteria.
    #[serde(default)]
    pub success_criteria: String,
}

impl TaskParameters {
    /// Creates a task with default scene, robot and goal.
    #[must_use]
    pub fn new(
        task_id: impl Into<String>,
        task_description: impl Into<String>,
        task_type: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_description: task_description.into(),
            task_type: task_type.into(),
            difficulty,
            scene_config: SceneConfig::default(),
            robot: RobotConfig::default(),
            robot_goal: RobotGoal::default(),
            domain_randomization: DomainRandomization::default(),
            success_criteria: String::new(),
        }
    }

    /// Sets the goal target position.
    #[must_use]
    pub fn with_target(mut self, target: [f64; 3]) -> Self {
        self.robot_goal.target_position = Some(target);
        self
    }

    /// Adds an object to the scene.
    #[must_use]
    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.scene_config.objects.push(object);
        self
    }

    /// Checks that the task can be handed to an executor.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::InvalidTask`] for an empty id or type, a
    /// non-finite coordinate, or an inverted randomization range.
    pub fn validate(&self) -> Result<()> {
        if self.task_id.trim().is_empty() {
            return Err(AzrError::invalid_task("task id is empty"));
        }
        if self.task_type.trim().is_empty() {
            return Err(AzrError::invalid_task(format!(
                "task {} has no task type",
                self.task_id
            )));
        }
        if !is_finite3(&self.robot.position) {
            return Err(AzrError::invalid_task(format!(
                "task {}: robot position is not finite",
                self.task_id
            )));
        }
        if let Some(target) = &self.robot_goal.target_position
            && !is_finite3(target)
        {
            return Err(AzrError::invalid_task(format!(
                "task {}: target position is not finite",
                self.task_id
            )));
        }
        for object in &self.scene_config.objects {
            if !is_finite3(&object.position) {
                return Err(AzrError::invalid_task(format!(
                    "task {}: object '{}' position is not finite",
                    self.task_id, object.name
                )));
            }
        }
        for (name, range) in &self.domain_randomization.ranges {
            if !range.is_valid() {
                return Err(AzrError::invalid_task(format!(
                    "task {}: randomization range '{name}' is invalid ({}, {})",
                    self.task_id, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

fn is_finite3(v: &[f64; 3]) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Scene description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Objects to spawn.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl SceneConfig {
    /// Looks up an object by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

/// An object spawned into the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name, unique within the scene.
    pub name: String,

    /// Object kind.
    pub kind: ObjectKind,

    /// Position in world coordinates (meters).
    pub position: [f64; 3],

    /// Extents (meters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 3]>,

    /// RGBA color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 4]>,
}

impl SceneObject {
    /// Creates an object without size or color.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ObjectKind, position: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            size: None,
            color: None,
        }
    }

    /// Sets the extents.
    #[must_use]
    pub const fn with_size(mut self, size: [f64; 3]) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the color.
    #[must_use]
    pub const fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }
}

/// Kinds of scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Rigid box.
    Box,
    /// Rigid sphere.
    Sphere,
    /// Flat goal region with no collision.
    Zone,
    /// Mobile robot body.
    Robot,
}

/// Robot to create for an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Instance name.
    pub name: String,

    /// Robot model (e.g. `ur10`, `franka_panda`).
    pub robot_type: String,

    /// Base position.
    pub position: [f64; 3],
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "default_robot".to_string(),
            robot_type: "ur10".to_string(),
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// Goal for the robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotGoal {
    /// Target end-effector position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<[f64; 3]>,

    /// Name of the object to act on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object: Option<String>,
}

/// Domain randomization settings for a task.
///
/// Numeric parameters are `[min, max]` ranges; everything else is a label
/// such as `friction_level = "high"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRandomization {
    /// Numeric ranges keyed by parameter name.
    #[serde(default)]
    pub ranges: BTreeMap<String, ParamRange>,

    /// Categorical settings keyed by parameter name.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl DomainRandomization {
    /// Adds a numeric range.
    #[must_use]
    pub fn with_range(mut self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.ranges.insert(name.into(), ParamRange::new(min, max));
        self
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    /// Scales every range about its midpoint.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .map(|(k, r)| (k.clone(), r.scaled(factor)))
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Returns true if nothing is randomized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.labels.is_empty()
    }
}

/// A closed numeric interval, serialized as `[min, max]`.
///
/// # Example
///
/// ```
/// use azr_types::ParamRange;
///
/// let range = ParamRange::new(0.1, 0.3);
/// let narrow = range.scaled(0.5);
/// assert!((narrow.min - 0.15).abs() < 1e-12);
/// assert!((narrow.max - 0.25).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ParamRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ParamRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        self.min + self.width() / 2.0
    }

    /// Width of the range.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Scales the range about its midpoint.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mid = self.midpoint();
        Self {
            min: mid - (mid - self.min) * factor,
            max: mid + (self.max - mid) * factor,
        }
    }

    /// Returns true if `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true if both bounds are finite and ordered and the width
    /// is representable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.width().is_finite()
    }
}

impl From<[f64; 2]> for ParamRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ParamRange> for [f64; 2] {
    fn from(range: ParamRange) -> Self {
        [range.min, range.max]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_task() -> TaskParameters {
        TaskParameters::new("t1", "Move the cube", "pick_and_place", Difficulty::Easy)
            .with_target([0.3, 0.3, 0.05])
            .with_object(
                SceneObject::new("cube", ObjectKind::Box, [0.0, 0.0, 0.0])
                    .with_size([0.05, 0.05, 0.05]),
            )
    }

    #[test]
    fn valid_task_passes() {
        assert!(sample_task().validate().is_ok());
    }

    #[test]
    fn empty_id_rejected() {
        let mut task = sample_task();
        task.task_id = "  ".to_string();
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn empty_type_rejected() {
        let mut task = sample_task();
        task.task_type.clear();
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn non_finite_target_rejected() {
        let task = sample_task().with_target([f64::NAN, 0.0, 0.0]);
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut task = sample_task();
        task.domain_randomization = DomainRandomization::default().with_range("gravity", -9.8, -10.0);
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn overflowing_width_rejected() {
        assert!(!ParamRange::new(-1.0e308, 1.0e308).is_valid());
        assert!(!ParamRange::new(-f64::MAX, f64::MAX).is_valid());
        assert!(ParamRange::new(1.0e308, 1.7e308).is_valid());

        let mut task = sample_task();
        task.domain_randomization =
            DomainRandomization::default().with_range("friction", -1.0e308, 1.0e308);
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn range_that_overflows_once_widened_is_rejected() {
        let range = ParamRange::new(-0.7e308, 0.7e308);
        assert!(range.is_valid());
        assert!(!range.scaled(1.5).is_valid());

        let mut task = sample_task();
        task.domain_randomization = DomainRandomization::default()
            .with_range("friction", -0.7e308, 0.7e308)
            .scaled(1.5);
        assert!(matches!(task.validate(), Err(AzrError::InvalidTask(_))));
    }

    #[test]
    fn midpoint_of_large_range_is_finite() {
        let range = ParamRange::new(1.0e308, 1.7e308);
        assert!(range.midpoint().is_finite());
        assert!(range.contains(range.midpoint()));
    }

    #[test]
    fn object_lookup() {
        let task = sample_task();
        assert!(task.scene_config.object("cube").is_some());
        assert!(task.scene_config.object("sphere").is_none());
    }

    #[test]
    fn range_scaling_keeps_midpoint() {
        let range = ParamRange::new(-10.0, -9.0);
        let wide = range.scaled(1.5);
        assert_relative_eq!(wide.midpoint(), range.midpoint(), epsilon = 1e-12);
        assert_relative_eq!(wide.width(), 1.5, epsilon = 1e-12);
        assert!(wide.contains(-9.9));
        assert!(!range.contains(-8.0));
    }

    #[test]
    fn randomization_scaled_keeps_labels() {
        let dr = DomainRandomization::default()
            .with_range("cube_mass", 0.1, 0.2)
            .with_label("friction_level", "medium");
        let scaled = dr.scaled(0.5);
        assert_eq!(scaled.labels.get("friction_level").map(String::as_str), Some("medium"));
        assert_relative_eq!(scaled.ranges["cube_mass"].width(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn range_serializes_as_pair() {
        let json = serde_json::to_string(&ParamRange::new(0.5, 1.0)).unwrap_or_default();
        assert_eq!(json, "[0.5,1.0]");
    }

    #[test]
    fn task_serialization() {
        let task = sample_task();
        let json = serde_json::to_string(&task).unwrap_or_default();
        let parsed: std::result::Result<TaskParameters, _> = serde_json::from_str(&json);
        assert_eq!(parsed.ok(), Some(task));
    }
}
