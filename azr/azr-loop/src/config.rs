//! Run configuration.
//!
//! A configuration document is TOML with four sections:
//!
//! ```toml
//! [simulation]
//! environment_path = "default_environment"
//! physics_dt = 0.01
//!
//! [learning]
//! reward_type = "shaped"
//! history_size = 10
//!
//! [groot_n1]
//! api_type = "mock"
//! mock_enabled = true
//!
//! [azr]
//! max_episodes = 100
//! ```
//!
//! The keys shown for `simulation`, `learning` and `groot_n1` are required;
//! every other key falls back to its default.

use std::fs;
use std::path::Path;

use azr_policy::PolicyConfig;
use azr_proposal::ProposalConfig;
use azr_reward::{MetricPolicy, RewardCalculator, RewardType};
use azr_sim::SimulationConfig;
use azr_types::{AzrError, Difficulty, Result};
use serde::{Deserialize, Serialize};

/// Absolute episode ceiling, regardless of configuration.
pub const MAX_EPISODE_CEILING: usize = 10_000;

/// Keys that must be present in a configuration document.
pub const REQUIRED_KEYS: [(&str, &str); 6] = [
    ("simulation", "environment_path"),
    ("simulation", "physics_dt"),
    ("learning", "reward_type"),
    ("learning", "history_size"),
    ("groot_n1", "api_type"),
    ("groot_n1", "mock_enabled"),
];

/// Reward shaping, selection feedback and difficulty scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Reward shape.
    pub reward_type: RewardType,

    /// Treatment of missing metrics on successful runs.
    pub metric_policy: MetricPolicy,

    /// Rolling window (episodes) for the difficulty success rate.
    pub history_size: usize,

    /// Episodes required since the last difficulty change before the
    /// level may move again.
    pub min_history: usize,

    /// Success rate at or above which difficulty escalates.
    pub escalate_threshold: f64,

    /// Success rate at or below which difficulty de-escalates.
    pub deescalate_threshold: f64,

    /// Difficulty of the first episode.
    pub initial_difficulty: Difficulty,

    /// Selection-weight step size.
    pub learning_rate: f64,

    /// Selection-weight floor; at least [`azr_policy::MIN_WEIGHT_FLOOR`].
    pub min_weight: f64,

    /// Probability of drawing from the task-type success list.
    pub match_task_bias: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            reward_type: RewardType::Shaped,
            metric_policy: MetricPolicy::Strict,
            history_size: 10,
            min_history: 3,
            escalate_threshold: 0.8,
            deescalate_threshold: 0.2,
            initial_difficulty: Difficulty::Medium,
            learning_rate: 0.1,
            min_weight: 0.1,
            match_task_bias: 0.7,
        }
    }
}

impl LearningConfig {
    fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(AzrError::configuration("learning.history_size must be > 0"));
        }
        if self.min_history == 0 || self.min_history > self.history_size {
            return Err(AzrError::configuration(format!(
                "learning.min_history must lie in [1, {}] (got {})",
                self.history_size, self.min_history
            )));
        }
        for (key, value) in [
            ("escalate_threshold", self.escalate_threshold),
            ("deescalate_threshold", self.deescalate_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AzrError::configuration(format!(
                    "learning.{key} must lie in [0, 1] (got {value})"
                )));
            }
        }
        if self.deescalate_threshold >= self.escalate_threshold {
            return Err(AzrError::configuration(format!(
                "learning.deescalate_threshold ({}) must be below escalate_threshold ({})",
                self.deescalate_threshold, self.escalate_threshold
            )));
        }
        Ok(())
    }
}

/// Loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzrConfig {
    /// Episodes per run unless overridden.
    pub max_episodes: usize,
}

impl Default for AzrConfig {
    fn default() -> Self {
        Self { max_episodes: 100 }
    }
}

/// Complete configuration for a GROOTZERO run.
///
/// # Example
///
/// ```
/// use azr_loop::GrootzeroConfig;
///
/// let config = GrootzeroConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.learning.history_size, 10);
/// assert_eq!(config.azr.max_episodes, 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrootzeroConfig {
    /// Simulation executor settings.
    pub simulation: SimulationConfig,

    /// Learning settings.
    pub learning: LearningConfig,

    /// Proposal source settings.
    pub groot_n1: ProposalConfig,

    /// Loop limits.
    pub azr: AzrConfig,
}

impl GrootzeroConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if the file cannot be read,
    /// is not valid TOML, lacks required keys, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            AzrError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] listing every missing required
    /// key, or describing the first parse or validation failure.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| AzrError::configuration(format!("invalid TOML: {e}")))?;
        check_required(&table)?;

        let config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|e| AzrError::configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AzrError::configuration(format!("cannot serialize configuration: {e}")))
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Io`] on filesystem failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Checks value ranges across every section.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        self.learning.validate()?;
        self.groot_n1.validate()?;
        self.policy_config().validate()?;
        if self.azr.max_episodes == 0 || self.azr.max_episodes > MAX_EPISODE_CEILING {
            return Err(AzrError::configuration(format!(
                "azr.max_episodes must lie in [1, {MAX_EPISODE_CEILING}] (got {})",
                self.azr.max_episodes
            )));
        }
        Ok(())
    }

    /// Selection-policy settings derived from the learning section.
    ///
    /// The policy seed comes from the proposal source configuration.
    #[must_use]
    pub fn policy_config(&self) -> PolicyConfig {
        let config = PolicyConfig {
            min_weight: self.learning.min_weight,
            ..PolicyConfig::default()
        }
        .with_learning_rate(self.learning.learning_rate)
        .with_match_task_bias(self.learning.match_task_bias);
        match self.groot_n1.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Reward calculator for this run.
    #[must_use]
    pub const fn reward_calculator(&self) -> RewardCalculator {
        RewardCalculator::new(self.learning.metric_policy).with_reward_type(self.learning.reward_type)
    }

    /// Seeds the simulator and the proposal source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = Some(seed);
        self.groot_n1.seed = Some(seed);
        self
    }
}

/// Reports every missing required section or key at once.
fn check_required(table: &toml::Table) -> Result<()> {
    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|(section, key)| {
            table
                .get(*section)
                .and_then(toml::Value::as_table)
                .is_none_or(|s| !s.contains_key(*key))
        })
        .map(|(section, key)| format!("{section}.{key}"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AzrError::configuration(format!(
            "missing required configuration keys: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"
[simulation]
environment_path = "default_environment"
physics_dt = 0.01

[learning]
reward_type = "binary"
history_size = 20

[groot_n1]
api_type = "mock"
mock_enabled = true
"#;

    #[test]
    fn default_is_valid() {
        assert!(GrootzeroConfig::default().validate().is_ok());
    }

    #[test]
    fn minimal_document_fills_defaults() {
        let config = GrootzeroConfig::from_toml_str(MINIMAL).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.learning.reward_type, RewardType::Binary);
        assert_eq!(config.learning.history_size, 20);
        assert_eq!(config.learning.min_history, 3);
        assert_eq!(config.learning.initial_difficulty, Difficulty::Medium);
        assert_eq!(config.azr.max_episodes, 100);
        assert_relative_eq!(config.simulation.physics_dt, 0.01);
    }

    #[test]
    fn missing_keys_are_all_listed() {
        let text = "[simulation]\nphysics_dt = 0.01\n\n[learning]\nreward_type = \"shaped\"\n";
        let err = GrootzeroConfig::from_toml_str(text).err();
        let Some(AzrError::Configuration(msg)) = err else {
            panic!("expected configuration error, got {err:?}");
        };
        assert!(msg.contains("simulation.environment_path"));
        assert!(msg.contains("learning.history_size"));
        assert!(msg.contains("groot_n1.api_type"));
        assert!(msg.contains("groot_n1.mock_enabled"));
        assert!(!msg.contains("simulation.physics_dt"));
    }

    #[test]
    fn invalid_toml_is_configuration_error() {
        assert!(matches!(
            GrootzeroConfig::from_toml_str("[simulation"),
            Err(AzrError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_reward_type_is_rejected() {
        let text = MINIMAL.replace("\"binary\"", "\"quadratic\"");
        assert!(matches!(
            GrootzeroConfig::from_toml_str(&text),
            Err(AzrError::Configuration(_))
        ));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let mut config = GrootzeroConfig::default();
        config.learning.deescalate_threshold = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn episode_budget_is_bounded() {
        let mut config = GrootzeroConfig::default();
        config.azr.max_episodes = MAX_EPISODE_CEILING + 1;
        assert!(config.validate().is_err());
        config.azr.max_episodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn weight_floor_below_minimum_is_rejected() {
        let mut config = GrootzeroConfig::default();
        config.learning.min_weight = 0.05;
        assert!(matches!(config.validate(), Err(AzrError::Configuration(_))));
        config.learning.min_weight = 0.2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn policy_config_follows_learning_section() {
        let mut config = GrootzeroConfig::default().with_seed(9);
        config.learning.learning_rate = 0.25;
        let policy = config.policy_config();
        assert_relative_eq!(policy.learning_rate, 0.25);
        assert_relative_eq!(policy.min_weight, 0.1);
        assert_eq!(policy.seed, Some(9));
    }
}
