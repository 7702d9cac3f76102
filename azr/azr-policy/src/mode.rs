//! Controller selection modes.

use std::fmt;
use std::str::FromStr;

use azr_types::AzrError;
use serde::{Deserialize, Serialize};

/// How a controller is drawn from the pool.
///
/// # Example
///
/// ```
/// use azr_policy::SelectionMode;
///
/// let mode: SelectionMode = "match_task".parse().unwrap_or_default();
/// assert_eq!(mode, SelectionMode::MatchTask);
/// assert!(!mode.is_deterministic());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Round-robin by call count, ignoring weights.
    Sequential,
    /// Draw proportionally to the selection weights.
    #[default]
    #[serde(alias = "weighted", alias = "performance_weighted")]
    Random,
    /// Prefer controllers that succeeded on the same task type.
    MatchTask,
}

impl SelectionMode {
    /// All modes.
    pub const ALL: [Self; 3] = [Self::Sequential, Self::Random, Self::MatchTask];

    /// Returns true if the mode never consults the random generator.
    #[must_use]
    pub const fn is_deterministic(self) -> bool {
        matches!(self, Self::Sequential)
    }

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::MatchTask => "match_task",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = AzrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            // `performance_weighted` is the legacy configuration spelling.
            "random" | "weighted" | "performance_weighted" => Ok(Self::Random),
            "match_task" => Ok(Self::MatchTask),
            other => Err(AzrError::configuration(format!(
                "unknown controller selection mode '{other}'"
            ))),
        }
    }
}
