//! Outcome of running a controller in simulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AzrError;

/// Status returned by a controller on every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerStatus {
    /// The goal has been reached.
    Success,
    /// The controller gave up.
    Failure,
    /// Keep stepping.
    Running,
}

impl ControllerStatus {
    /// Returns true for `Success` and `Failure`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// The literal status string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControllerStatus {
    type Err = AzrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "running" => Ok(Self::Running),
            other => Err(AzrError::invalid_controller(format!(
                "unknown controller status '{other}'"
            ))),
        }
    }
}

/// Metrics collected while executing a controller.
///
/// Every field is optional: synthetic failures carry no metrics at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Simulated seconds until the run ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_completion: Option<f64>,

    /// Straight-line distance over travelled distance, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_efficiency: Option<f64>,

    /// Actuation efficiency, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_efficiency: Option<f64>,

    /// Simulation steps until the run ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_to_completion: Option<usize>,
}

impl ExecutionMetrics {
    /// Creates metrics with the three efficiency inputs set.
    #[must_use]
    pub const fn new(time_to_completion: f64, path_efficiency: f64, energy_efficiency: f64) -> Self {
        Self {
            time_to_completion: Some(time_to_completion),
            path_efficiency: Some(path_efficiency),
            energy_efficiency: Some(energy_efficiency),
            steps_to_completion: None,
        }
    }

    /// Sets the step count.
    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps_to_completion = Some(steps);
        self
    }

    /// Returns true if no metric was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.time_to_completion.is_none()
            && self.path_efficiency.is_none()
            && self.energy_efficiency.is_none()
            && self.steps_to_completion.is_none()
    }
}

/// Result of executing one controller against one task.
///
/// # Example
///
/// ```
/// use azr_types::{ExecutionMetrics, ExecutionResult};
///
/// let ok = ExecutionResult::succeeded(ExecutionMetrics::new(2.0, 0.9, 0.8));
/// assert!(ok.success);
///
/// let crashed = ExecutionResult::failed("controller panicked");
/// assert!(!crashed.success);
/// assert!(crashed.metrics.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the task was accomplished.
    pub success: bool,

    /// Collected metrics.
    #[serde(default)]
    pub metrics: ExecutionMetrics,

    /// Why the run failed, if it did not end normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ExecutionResult {
    /// A successful run.
    #[must_use]
    pub const fn succeeded(metrics: ExecutionMetrics) -> Self {
        Self {
            success: true,
            metrics,
            failure_reason: None,
        }
    }

    /// A run that completed normally without reaching the goal.
    #[must_use]
    pub const fn unsuccessful(metrics: ExecutionMetrics) -> Self {
        Self {
            success: false,
            metrics,
            failure_reason: None,
        }
    }

    /// A synthetic failure with no metrics.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            metrics: ExecutionMetrics::default(),
            failure_reason: Some(reason.into()),
        }
    }

    /// Attaches a failure reason.
    #[must_use]
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_literals() {
        assert_eq!("success".parse::<ControllerStatus>(), Ok(ControllerStatus::Success));
        assert_eq!("failure".parse::<ControllerStatus>(), Ok(ControllerStatus::Failure));
        assert_eq!("running".parse::<ControllerStatus>(), Ok(ControllerStatus::Running));
    }

    #[test]
    fn status_rejects_other_strings() {
        let err = "continue".parse::<ControllerStatus>();
        assert!(matches!(err, Err(AzrError::InvalidController(_))));
    }

    #[test]
    fn terminal_statuses() {
        assert!(ControllerStatus::Success.is_terminal());
        assert!(ControllerStatus::Failure.is_terminal());
        assert!(!ControllerStatus::Running.is_terminal());
    }

    #[test]
    fn metrics_builder() {
        let metrics = ExecutionMetrics::new(1.5, 0.7, 0.6).with_steps(150);
        assert_eq!(metrics.steps_to_completion, Some(150));
        assert!(!metrics.is_empty());
        assert!(ExecutionMetrics::default().is_empty());
    }

    #[test]
    fn failed_result_carries_reason() {
        let result = ExecutionResult::failed("timeout after 1000 steps");
        assert_eq!(result.failure_reason.as_deref(), Some("timeout after 1000 steps"));
    }

    #[test]
    fn missing_metrics_deserialize_as_none() {
        let parsed: std::result::Result<ExecutionResult, _> =
            serde_json::from_str(r#"{"success":true,"metrics":{"path_efficiency":0.5}}"#);
        let result = parsed.unwrap_or_default();
        assert!(result.success);
        assert_eq!(result.metrics.path_efficiency, Some(0.5));
        assert!(result.metrics.time_to_completion.is_none());
    }
}
