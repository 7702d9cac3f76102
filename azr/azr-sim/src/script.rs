//! Controller scripts.
//!
//! Generated controller code is a small TOML document naming a control
//! law and its parameters. Compiling a script validates it and yields a
//! boxed [`Controller`]; nothing in the script is ever evaluated as code.
//!
//! ```toml
//! kind = "proportional_derivative"
//! name = "pd_controller"
//! target = [0.3, 0.3, 0.05]
//! gain = 0.2
//! derivative_gain = 0.05
//! tolerance = 0.03
//!
//! [metadata]
//! task_id = "mock_task_0000002a"
//! ```

use std::collections::BTreeMap;

use azr_types::{AzrError, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::controller::{Controller, PdController, ProportionalController, WaypointController};

/// Control law named by a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Proportional position control.
    Proportional,
    /// Proportional-derivative position control.
    ProportionalDerivative,
    /// Pick-and-place waypoint state machine.
    Waypoint,
}

impl ControllerKind {
    /// Script name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proportional => "proportional",
            Self::ProportionalDerivative => "proportional_derivative",
            Self::Waypoint => "waypoint",
        }
    }

    const fn default_gain(self) -> f64 {
        match self {
            Self::Proportional => 0.1,
            Self::ProportionalDerivative => 0.2,
            Self::Waypoint => 0.15,
        }
    }

    const fn default_tolerance(self) -> f64 {
        match self {
            Self::Proportional => 0.05,
            Self::ProportionalDerivative => 0.03,
            Self::Waypoint => 0.02,
        }
    }
}

/// A parsed controller script.
///
/// Omitted parameters take per-kind defaults. A missing `target` makes
/// the controller drive toward the task goal.
///
/// # Example
///
/// ```
/// use azr_sim::{ControllerKind, ControllerScript};
///
/// let script = ControllerScript::parse("kind = \"proportional\"\ntarget = [0.3, 0.0, 0.1]\n");
/// let script = script.unwrap_or_else(|e| panic!("{e}"));
/// assert_eq!(script.kind, ControllerKind::Proportional);
/// assert!(script.compile(0.01).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerScript {
    /// Control law.
    pub kind: ControllerKind,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Position to reach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 3]>,

    /// Proportional gain, in (0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,

    /// Derivative gain (PD only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative_gain: Option<f64>,

    /// Distance at which a position counts as reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,

    /// Height above the object for approach and lift (waypoint only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_height: Option<f64>,

    /// Object to pick, overriding the task's target object (waypoint only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Steps allowed per waypoint (waypoint only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_steps: Option<usize>,

    /// Task bookkeeping carried along with the code.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ControllerScript {
    /// Parses a script.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::ControllerExecution`] if the text is not a
    /// well-formed script.
    pub fn parse(code: &str) -> Result<Self> {
        toml::from_str(code)
            .map_err(|e| AzrError::controller_execution(format!("controller script does not parse: {e}")))
    }

    /// Serializes the script back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::ControllerExecution`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| AzrError::controller_execution(e.to_string()))
    }

    /// Display name, defaulting to the kind.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Validates the script and builds its controller.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::ControllerExecution`] for a parameter out of
    /// range or a parameter the kind does not accept.
    pub fn compile(&self, physics_dt: f64) -> Result<Box<dyn Controller>> {
        let kind = self.kind;
        let name = self.display_name().to_string();
        let gain = self.gain.unwrap_or(kind.default_gain());
        let tolerance = self.tolerance.unwrap_or(kind.default_tolerance());

        if !(gain.is_finite() && gain > 0.0 && gain <= 1.0) {
            return Err(self.reject(format!("gain must lie in (0, 1] (got {gain})")));
        }
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(self.reject(format!("tolerance must be > 0 (got {tolerance})")));
        }
        let target = match self.target {
            Some(t) if t.iter().all(|c| c.is_finite()) => Some(Point3::from(t)),
            Some(t) => return Err(self.reject(format!("target {t:?} is not finite"))),
            None => None,
        };
        if kind != ControllerKind::ProportionalDerivative && self.derivative_gain.is_some() {
            return Err(self.reject("derivative_gain is only accepted by proportional_derivative"));
        }
        if kind != ControllerKind::Waypoint
            && (self.approach_height.is_some() || self.object.is_some() || self.timeout_steps.is_some())
        {
            return Err(self.reject(
                "approach_height, object and timeout_steps are only accepted by waypoint",
            ));
        }

        let controller: Box<dyn Controller> = match kind {
            ControllerKind::Proportional => {
                Box::new(ProportionalController::new(name, target, gain, tolerance))
            }
            ControllerKind::ProportionalDerivative => {
                let derivative_gain = self.derivative_gain.unwrap_or(0.05);
                if !(derivative_gain.is_finite() && derivative_gain >= 0.0) {
                    return Err(self.reject(format!(
                        "derivative_gain must be >= 0 (got {derivative_gain})"
                    )));
                }
                Box::new(PdController::new(
                    name,
                    target,
                    gain,
                    derivative_gain,
                    tolerance,
                    physics_dt,
                ))
            }
            ControllerKind::Waypoint => {
                let approach_height = self.approach_height.unwrap_or(0.1);
                let timeout_steps = self.timeout_steps.unwrap_or(1000);
                if !(approach_height.is_finite() && approach_height >= 0.0) {
                    return Err(self.reject(format!(
                        "approach_height must be >= 0 (got {approach_height})"
                    )));
                }
                if timeout_steps == 0 {
                    return Err(self.reject("timeout_steps must be > 0"));
                }
                Box::new(WaypointController::new(
                    name,
                    target,
                    self.object.clone(),
                    gain,
                    tolerance,
                    approach_height,
                    timeout_steps,
                ))
            }
        };
        Ok(controller)
    }

    fn reject(&self, reason: impl std::fmt::Display) -> AzrError {
        AzrError::controller_execution(format!("{} script rejected: {reason}", self.kind.as_str()))
    }
}

/// Parses and compiles controller code in one step.
///
/// # Errors
///
/// Returns [`AzrError::ControllerExecution`] if the code is malformed.
pub fn compile_controller(code: &str, physics_dt: f64) -> Result<Box<dyn Controller>> {
    ControllerScript::parse(code)?.compile(physics_dt)
}
