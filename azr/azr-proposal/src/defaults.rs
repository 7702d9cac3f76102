//! Built-in task templates and controller scripts.

use azr_types::{Difficulty, DomainRandomization, ObjectKind, SceneObject, TaskParameters};

/// Replaced by the task goal as a `[x, y, z]` array.
pub const TARGET_POSITION_PLACEHOLDER: &str = "TARGET_POSITION_PLACEHOLDER";

/// Replaced by the task id.
pub const TASK_ID_PLACEHOLDER: &str = "TASK_ID_PLACEHOLDER";

/// Replaced by the task description.
pub const TASK_DESCRIPTION_PLACEHOLDER: &str = "TASK_DESCRIPTION_PLACEHOLDER";

/// Pick-and-place (easy), stacking (medium) and navigation (hard).
#[must_use]
pub fn default_tasks() -> Vec<TaskParameters> {
    let mut pick = TaskParameters::new(
        "template_pick_and_place",
        "Move the cube to the green zone.",
        "pick_and_place",
        Difficulty::Easy,
    )
    .with_target([0.3, 0.3, 0.05])
    .with_object(SceneObject::new("cube", ObjectKind::Box, [0.0, 0.0, 0.0]).with_size([0.05; 3]))
    .with_object(
        SceneObject::new("green_zone", ObjectKind::Zone, [0.3, 0.3, 0.0])
            .with_size([0.1, 0.1, 0.001])
            .with_color([0.0, 1.0, 0.0, 0.5]),
    );
    pick.robot_goal.target_object = Some("cube".to_string());
    pick.domain_randomization = DomainRandomization::default()
        .with_range("gravity", -10.0, -9.8)
        .with_range("cube_mass", 0.1, 0.2)
        .with_label("friction_level", "medium");
    pick.success_criteria = "Cube is within 0.05m of the center of the green zone.".to_string();

    let mut stack = TaskParameters::new(
        "template_stacking",
        "Stack three blocks in a tower.",
        "stacking",
        Difficulty::Medium,
    )
    .with_target([0.0, 0.0, 0.15])
    .with_object(SceneObject::new("block_1", ObjectKind::Box, [0.1, 0.1, 0.0]).with_size([0.05; 3]))
    .with_object(SceneObject::new("block_2", ObjectKind::Box, [-0.1, 0.1, 0.0]).with_size([0.05; 3]))
    .with_object(SceneObject::new("block_3", ObjectKind::Box, [0.0, -0.1, 0.0]).with_size([0.05; 3]))
    .with_object(
        SceneObject::new("target_zone", ObjectKind::Zone, [0.0, 0.0, 0.0])
            .with_size([0.1, 0.1, 0.001])
            .with_color([1.0, 0.0, 0.0, 0.5]),
    );
    stack.domain_randomization = DomainRandomization::default()
        .with_range("gravity", -10.0, -9.5)
        .with_range("block_mass", 0.05, 0.15)
        .with_label("friction_level", "high");
    stack.success_criteria =
        "All three blocks are stacked on top of each other within the target zone.".to_string();

    let mut navigate = TaskParameters::new(
        "template_navigation",
        "Navigate through an obstacle course to reach the goal.",
        "navigation",
        Difficulty::Hard,
    )
    .with_target([0.8, 0.0, 0.0])
    .with_object(SceneObject::new("robot", ObjectKind::Robot, [0.0, 0.0, 0.0]))
    .with_object(SceneObject::new("obstacle_1", ObjectKind::Box, [0.2, 0.2, 0.0]).with_size([0.1, 0.1, 0.2]))
    .with_object(SceneObject::new("obstacle_2", ObjectKind::Box, [0.4, 0.0, 0.0]).with_size([0.1, 0.3, 0.2]))
    .with_object(SceneObject::new("obstacle_3", ObjectKind::Box, [0.6, 0.3, 0.0]).with_size([0.1, 0.1, 0.2]))
    .with_object(
        SceneObject::new("goal_zone", ObjectKind::Zone, [0.8, 0.0, 0.0])
            .with_size([0.1, 0.1, 0.001])
            .with_color([0.0, 0.0, 1.0, 0.5]),
    );
    navigate.domain_randomization = DomainRandomization::default()
        .with_range("gravity", -10.0, -9.0)
        .with_range("obstacle_positions", 0.05, 0.1)
        .with_label("friction_level", "random");
    navigate.success_criteria =
        "Robot reaches the goal zone without colliding with obstacles.".to_string();

    vec![pick, stack, navigate]
}

const P_CONTROLLER: &str = r#"# Simple P-controller for pick and place tasks.
kind = "proportional"
name = "p_controller"
target = TARGET_POSITION_PLACEHOLDER
gain = 0.1
tolerance = 0.05

[metadata]
task_id = "TASK_ID_PLACEHOLDER"
task_description = "TASK_DESCRIPTION_PLACEHOLDER"
"#;

const PD_CONTROLLER: &str = r#"# PD-controller for manipulation tasks.
kind = "proportional_derivative"
name = "pd_controller"
target = TARGET_POSITION_PLACEHOLDER
gain = 0.2
derivative_gain = 0.05
tolerance = 0.03

[metadata]
task_id = "TASK_ID_PLACEHOLDER"
task_description = "TASK_DESCRIPTION_PLACEHOLDER"
"#;

const STATE_MACHINE_CONTROLLER: &str = r#"# State machine controller for complex tasks.
# Approaches the target object from above, grasps, lifts, carries and releases.
kind = "waypoint"
name = "state_machine_controller"
target = TARGET_POSITION_PLACEHOLDER
gain = 0.15
tolerance = 0.02
approach_height = 0.1
timeout_steps = 1000

[metadata]
task_id = "TASK_ID_PLACEHOLDER"
task_description = "TASK_DESCRIPTION_PLACEHOLDER"
"#;

/// P, PD and waypoint controller scripts with placeholders.
#[must_use]
pub fn default_controllers() -> Vec<String> {
    [P_CONTROLLER, PD_CONTROLLER, STATE_MACHINE_CONTROLLER]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Specializes a controller template to `task`.
///
/// The target placeholder is only replaced when the task has a goal
/// position; scripts that still carry it will not compile.
#[must_use]
pub fn apply_task_to_controller(code: &str, task: &TaskParameters) -> String {
    let mut out = code.to_string();
    if let Some([x, y, z]) = task.robot_goal.target_position {
        out = out.replace(TARGET_POSITION_PLACEHOLDER, &format!("[{x:?}, {y:?}, {z:?}]"));
    }
    out = out.replace(TASK_ID_PLACEHOLDER, &escape_basic_string(&task.task_id));
    out.replace(
        TASK_DESCRIPTION_PLACEHOLDER,
        &escape_basic_string(&task.task_description),
    )
}

fn escape_basic_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_templates_of_rising_difficulty() {
        let tasks = default_tasks();
        let levels: Vec<Difficulty> = tasks.iter().map(|t| t.difficulty).collect();
        assert_eq!(levels, vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]);
        assert!(tasks.iter().all(|t| t.validate().is_ok()));
        assert!(tasks.iter().all(|t| t.robot_goal.target_position.is_some()));
    }

    #[test]
    fn placeholders_are_replaced() {
        let task = TaskParameters::new("mock_task_0000abcd", "Say \"hi\"", "reaching", Difficulty::Easy)
            .with_target([0.3, 0.0, 1.0]);
        let code = apply_task_to_controller(P_CONTROLLER, &task);
        assert!(code.contains("target = [0.3, 0.0, 1.0]"));
        assert!(code.contains("task_id = \"mock_task_0000abcd\""));
        assert!(code.contains(r#"task_description = "Say \"hi\"""#));
        assert!(!code.contains("PLACEHOLDER"));
    }

    #[test]
    fn missing_target_leaves_placeholder() {
        let task = TaskParameters::new("t", "d", "reaching", Difficulty::Easy);
        let code = apply_task_to_controller(PD_CONTROLLER, &task);
        assert!(code.contains(TARGET_POSITION_PLACEHOLDER));
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_basic_string("a\\b"), "a\\\\b");
        assert_eq!(escape_basic_string("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_basic_string("\u{1}"), "\\u0001");
    }
}
