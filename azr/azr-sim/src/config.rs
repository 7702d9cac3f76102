//! Simulation configuration.

use std::time::Duration;

use azr_types::{AzrError, ParamRange, Result};
use serde::{Deserialize, Serialize};

/// Settings for the mock simulator.
///
/// Mirrors the `[simulation]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Environment asset to load.
    pub environment_path: String,

    /// Fixed physics timestep (seconds).
    pub physics_dt: f64,

    /// Whether a viewer would be attached. The kinematic mock never renders.
    pub render_enabled: bool,

    /// Step budget for one controller run.
    pub max_steps: usize,

    /// Wall-clock budget for one controller run (seconds).
    pub timeout_secs: f64,

    /// Scene-wide randomization.
    pub domain_randomization: RandomizationConfig,

    /// Random seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            environment_path: "default_environment".to_string(),
            physics_dt: 0.01,
            render_enabled: false,
            max_steps: 1000,
            timeout_secs: 5.0,
            domain_randomization: RandomizationConfig::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Sets the step budget.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Disables domain randomization.
    #[must_use]
    pub const fn without_randomization(mut self) -> Self {
        self.domain_randomization.enabled = false;
        self
    }

    /// Wall-clock budget as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] for a non-positive timestep or
    /// timeout, a zero step budget, or an inverted randomization range.
    pub fn validate(&self) -> Result<()> {
        if !self.physics_dt.is_finite() || self.physics_dt <= 0.0 {
            return Err(AzrError::configuration(format!(
                "simulation.physics_dt must be > 0 (got {})",
                self.physics_dt
            )));
        }
        if self.physics_dt > 1.0 {
            return Err(AzrError::configuration(
                "simulation.physics_dt > 1 second is likely an error",
            ));
        }
        if self.max_steps == 0 {
            return Err(AzrError::configuration("simulation.max_steps must be > 0"));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(AzrError::configuration(format!(
                "simulation.timeout_secs must be > 0 (got {})",
                self.timeout_secs
            )));
        }
        self.domain_randomization.validate()
    }
}

/// Ranges applied to every scene when randomization is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizationConfig {
    /// Master switch. When off, scenes use nominal physics.
    pub enabled: bool,

    /// Vertical gravity component (m/s²).
    pub gravity_range: ParamRange,

    /// Surface friction used for the `random` friction level.
    pub friction_range: ParamRange,

    /// Multiplier on every object mass.
    pub mass_range_factor: ParamRange,

    /// Relative actuation noise; 0 disables it.
    pub actuation_noise: f64,
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gravity_range: ParamRange::new(-10.0, -9.8),
            friction_range: ParamRange::new(0.5, 1.0),
            mass_range_factor: ParamRange::new(0.8, 1.2),
            actuation_noise: 0.0,
        }
    }
}

impl RandomizationConfig {
    fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("gravity_range", self.gravity_range),
            ("friction_range", self.friction_range),
            ("mass_range_factor", self.mass_range_factor),
        ] {
            if !range.is_valid() {
                return Err(AzrError::configuration(format!(
                    "simulation.domain_randomization.{name} is not a valid [min, max] pair"
                )));
            }
        }
        if self.mass_range_factor.min <= 0.0 {
            return Err(AzrError::configuration(
                "simulation.domain_randomization.mass_range_factor must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.actuation_noise) {
            return Err(AzrError::configuration(format!(
                "simulation.domain_randomization.actuation_noise must lie in [0, 1] (got {})",
                self.actuation_noise
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_timestep() {
        let config = SimulationConfig {
            physics_dt: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(AzrError::Configuration(_))));

        let config = SimulationConfig {
            physics_dt: 2.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let mut config = SimulationConfig::default();
        config.domain_randomization.friction_range = ParamRange::new(1.0, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_converts() {
        let config = SimulationConfig {
            timeout_secs: 0.25,
            ..SimulationConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn ranges_serialize_as_pairs() {
        let json = serde_json::to_value(SimulationConfig::default()).unwrap_or_default();
        let gravity = &json["domain_randomization"]["gravity_range"];
        assert_eq!(gravity[0], -10.0);
        assert_eq!(gravity[1], -9.8);
        assert!(json.get("seed").is_some_and(serde_json::Value::is_null));
    }
}
