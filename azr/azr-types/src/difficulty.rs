//! Task difficulty levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AzrError;

/// Difficulty of a proposed task.
///
/// Levels are ordered `Easy < Medium < Hard`.
///
/// # Example
///
/// ```
/// use azr_types::Difficulty;
///
/// assert!(Difficulty::Easy < Difficulty::Hard);
/// assert_eq!(Difficulty::Medium.harder(), Difficulty::Hard);
/// assert_eq!(Difficulty::Hard.harder(), Difficulty::Hard);
/// assert_eq!("easy".parse::<Difficulty>().ok(), Some(Difficulty::Easy));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Narrow randomization, reduced reward.
    Easy,
    /// Baseline.
    #[default]
    Medium,
    /// Wide randomization, boosted reward.
    Hard,
}

impl Difficulty {
    /// All levels in ascending order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Reward multiplier applied at this level.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.8,
            Self::Medium => 1.0,
            Self::Hard => 1.2,
        }
    }

    /// The next harder level, saturating at [`Difficulty::Hard`].
    #[must_use]
    pub const fn harder(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium | Self::Hard => Self::Hard,
        }
    }

    /// The next easier level, saturating at [`Difficulty::Easy`].
    #[must_use]
    pub const fn easier(self) -> Self {
        match self {
            Self::Hard => Self::Medium,
            Self::Medium | Self::Easy => Self::Easy,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AzrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(AzrError::invalid_metric(format!(
                "unrecognized difficulty level '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multipliers() {
        assert_relative_eq!(Difficulty::Easy.multiplier(), 0.8);
        assert_relative_eq!(Difficulty::Medium.multiplier(), 1.0);
        assert_relative_eq!(Difficulty::Hard.multiplier(), 1.2);
    }

    #[test]
    fn stepping_saturates() {
        assert_eq!(Difficulty::Easy.easier(), Difficulty::Easy);
        assert_eq!(Difficulty::Easy.harder(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.easier(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.harder(), Difficulty::Hard);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" Medium ".parse::<Difficulty>(), Ok(Difficulty::Medium));
    }

    #[test]
    fn parse_rejects_unknown_level() {
        let err = "extreme".parse::<Difficulty>();
        assert!(matches!(err, Err(AzrError::InvalidMetric(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for level in Difficulty::ALL {
            assert_eq!(level.to_string().parse::<Difficulty>(), Ok(level));
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap_or_default();
        assert_eq!(json, "\"hard\"");

        let unknown: Result<Difficulty, _> = serde_json::from_str("\"brutal\"");
        assert!(unknown.is_err());
    }
}
