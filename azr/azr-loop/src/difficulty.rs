//! Difficulty scheduling from the rolling success rate.

use azr_types::{Difficulty, LearningEvent};
use tracing::info;

use crate::config::LearningConfig;

/// Moves the difficulty level one step at a time based on recent outcomes.
///
/// The rate is taken over the last `window` episodes recorded since the
/// level last changed, and only once `min_history` such episodes exist.
///
/// # Example
///
/// ```
/// use azr_loop::DifficultySchedule;
/// use azr_types::Difficulty;
///
/// let mut schedule = DifficultySchedule::new(Difficulty::Medium, 10, 2, 0.8, 0.2);
/// assert_eq!(schedule.observe_outcome(true), None);
/// assert_eq!(schedule.observe_outcome(true), Some(Difficulty::Hard));
/// assert_eq!(schedule.level(), Difficulty::Hard);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultySchedule {
    level: Difficulty,
    window: usize,
    min_history: usize,
    escalate_at: f64,
    deescalate_at: f64,
    outcomes: Vec<bool>,
}

impl DifficultySchedule {
    /// Creates a schedule starting at `level`.
    #[must_use]
    pub fn new(
        level: Difficulty,
        window: usize,
        min_history: usize,
        escalate_at: f64,
        deescalate_at: f64,
    ) -> Self {
        Self {
            level,
            window: window.max(1),
            min_history: min_history.max(1),
            escalate_at,
            deescalate_at,
            outcomes: Vec::new(),
        }
    }

    /// Creates a schedule from the learning section of a configuration.
    #[must_use]
    pub fn from_config(config: &LearningConfig) -> Self {
        Self::new(
            config.initial_difficulty,
            config.history_size,
            config.min_history,
            config.escalate_threshold,
            config.deescalate_threshold,
        )
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> Difficulty {
        self.level
    }

    /// Episodes recorded since the level last changed.
    #[must_use]
    pub fn since_change(&self) -> usize {
        self.outcomes.len()
    }

    /// Success rate over the window, or `None` before any episode.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        let start = self.outcomes.len().saturating_sub(self.window);
        let recent = &self.outcomes[start..];
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().filter(|&&s| s).count() as f64 / recent.len() as f64)
    }

    /// Records the most recent history entry.
    ///
    /// Returns the new level if it changed.
    pub fn observe(&mut self, event: &LearningEvent) -> Option<Difficulty> {
        self.observe_outcome(event.success)
    }

    /// Records one episode outcome.
    ///
    /// Returns the new level if it changed. Levels saturate at
    /// [`Difficulty::Easy`] and [`Difficulty::Hard`]; a saturated level
    /// keeps accumulating outcomes.
    pub fn observe_outcome(&mut self, success: bool) -> Option<Difficulty> {
        self.outcomes.push(success);
        if self.outcomes.len() > self.window {
            self.outcomes.remove(0);
        }
        if self.outcomes.len() < self.min_history {
            return None;
        }

        let rate = self.success_rate()?;
        let next = if rate >= self.escalate_at {
            self.level.harder()
        } else if rate <= self.deescalate_at {
            self.level.easier()
        } else {
            self.level
        };
        if next == self.level {
            return None;
        }

        info!(from = %self.level, to = %next, success_rate = rate, "difficulty changed");
        self.level = next;
        self.outcomes.clear();
        Some(next)
    }
}
