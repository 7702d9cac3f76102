//! Proposal source configuration.

use std::fmt;
use std::str::FromStr;

use azr_policy::SelectionMode;
use azr_types::{AzrError, Result};
use serde::{Deserialize, Serialize};

/// Backend serving proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    /// In-process mock.
    #[default]
    Mock,
}

/// How the mock picks the next task template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSelectionMode {
    /// Cycle through the templates in order.
    #[default]
    Sequential,
    /// Uniform draw.
    Random,
    /// Uniform draw among templates at the current difficulty.
    Difficulty,
}

impl TaskSelectionMode {
    /// All modes.
    pub const ALL: [Self; 3] = [Self::Sequential, Self::Random, Self::Difficulty];

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Difficulty => "difficulty",
        }
    }
}

impl fmt::Display for TaskSelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskSelectionMode {
    type Err = AzrError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| AzrError::configuration(format!("unknown task selection mode '{s}'")))
    }
}

/// Settings for the proposal source.
///
/// Mirrors the `[groot_n1]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    /// Backend.
    pub api_type: ApiType,

    /// Whether the mock backend is enabled.
    pub mock_enabled: bool,

    /// Sampling temperature a model backend would use.
    pub temperature: f64,

    /// Token budget a model backend would use.
    pub max_tokens: usize,

    /// Task template selection.
    pub task_selection: TaskSelectionMode,

    /// Controller selection.
    pub controller_selection: SelectionMode,

    /// Random seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            api_type: ApiType::Mock,
            mock_enabled: true,
            temperature: 0.7,
            max_tokens: 2048,
            task_selection: TaskSelectionMode::Sequential,
            controller_selection: SelectionMode::Sequential,
            seed: None,
        }
    }
}

impl ProposalConfig {
    /// Sets the task selection mode.
    #[must_use]
    pub const fn with_task_selection(mut self, mode: TaskSelectionMode) -> Self {
        self.task_selection = mode;
        self
    }

    /// Sets the controller selection mode.
    #[must_use]
    pub const fn with_controller_selection(mut self, mode: SelectionMode) -> Self {
        self.controller_selection = mode;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if the mock is disabled (no
    /// other backend exists) or a sampling parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        if !self.mock_enabled {
            return Err(AzrError::configuration(
                "groot_n1.mock_enabled = false, but no foundation-model backend is available",
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(AzrError::configuration(format!(
                "groot_n1.temperature must be >= 0 (got {})",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AzrError::configuration("groot_n1.max_tokens must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ProposalConfig::default().validate().is_ok());
    }

    #[test]
    fn disabled_mock_rejected() {
        let config = ProposalConfig {
            mock_enabled: false,
            ..ProposalConfig::default()
        };
        assert!(matches!(config.validate(), Err(AzrError::Configuration(_))));
    }

    #[test]
    fn task_modes_parse() {
        for mode in TaskSelectionMode::ALL {
            assert_eq!(mode.as_str().parse::<TaskSelectionMode>(), Ok(mode));
        }
        assert!("curriculum".parse::<TaskSelectionMode>().is_err());
    }

    #[test]
    fn deserializes_partial_section() {
        let text = "api_type = \"mock\"\nmock_enabled = true\ncontroller_selection = \"match_task\"\n";
        let config: ProposalConfig = toml::from_str(text).unwrap_or_default();
        assert_eq!(config.controller_selection, SelectionMode::MatchTask);
        assert_eq!(config.task_selection, TaskSelectionMode::Sequential);
        assert_eq!(config.max_tokens, 2048);
    }

    #[test]
    fn unknown_api_type_rejected() {
        let text = "api_type = \"cloud\"\nmock_enabled = true\n";
        assert!(toml::from_str::<ProposalConfig>(text).is_err());
    }
}
