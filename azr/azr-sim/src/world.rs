//! Read-only world snapshot handed to controllers.

use azr_types::ObjectKind;
use nalgebra::{Point3, Vector3};

/// State of one scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    /// Object name, unique within the scene.
    pub name: String,
    /// Object category.
    pub kind: ObjectKind,
    /// Current position.
    pub position: Point3<f64>,
}

/// Snapshot of the scene at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    /// Simulated time (seconds).
    pub time: f64,
    /// Steps taken so far.
    pub step: usize,
    /// Gravity in effect.
    pub gravity: Vector3<f64>,
    /// Goal position of the task, if any.
    pub goal: Option<Point3<f64>>,
    /// Object the task is about, if any.
    pub target_object: Option<String>,
    /// Every object in the scene.
    pub objects: Vec<ObjectState>,
}

impl WorldState {
    /// Looks up an object by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectState> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Position of the task's target object, if it exists in the scene.
    #[must_use]
    pub fn target_object_position(&self) -> Option<Point3<f64>> {
        let name = self.target_object.as_deref()?;
        self.object(name).map(|o| o.position)
    }
}
