//! Evaluation results, learning history, and the per-episode context view.

use serde::{Deserialize, Serialize};

use crate::Difficulty;

/// Qualitative evaluation of a controller run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the controller succeeded.
    pub success: bool,

    /// Score in [0, 1].
    pub score: f64,

    /// Free-text feedback.
    pub feedback: String,

    /// Suggestions for the next attempt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// One entry of the learning history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvent {
    /// Episode number (0-indexed).
    pub episode: usize,

    /// Task identifier.
    pub task_id: String,

    /// Task description.
    pub task_description: String,

    /// Task category.
    pub task_type: String,

    /// Controller pool index used for the episode.
    pub controller_index: usize,

    /// Difficulty the episode was run at.
    pub difficulty: Difficulty,

    /// Whether the controller succeeded.
    pub success: bool,

    /// Evaluation score.
    pub score: f64,

    /// Reward fed back to the selection policy.
    pub reward: f64,

    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

/// Read-only view handed to a proposal source each episode.
///
/// Borrowed from the orchestrator's own state; proposal sources cannot
/// mutate the history or the difficulty through it.
#[derive(Debug, Clone, Copy)]
pub struct LearningContext<'a> {
    /// Current difficulty level.
    pub difficulty: Difficulty,

    /// Identifiers of every task proposed so far, oldest first.
    pub previous_task_ids: &'a [String],

    /// Learning history, oldest first.
    pub history: &'a [LearningEvent],
}

impl<'a> LearningContext<'a> {
    /// Creates a context view.
    #[must_use]
    pub const fn new(
        difficulty: Difficulty,
        previous_task_ids: &'a [String],
        history: &'a [LearningEvent],
    ) -> Self {
        Self {
            difficulty,
            previous_task_ids,
            history,
        }
    }

    /// A context with no history.
    #[must_use]
    pub const fn fresh(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            previous_task_ids: &[],
            history: &[],
        }
    }

    /// Success rate over the last `window` history entries.
    ///
    /// Returns `None` when the history is empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn recent_success_rate(&self, window: usize) -> Option<f64> {
        let start = self.history.len().saturating_sub(window);
        let recent = &self.history[start..];
        if recent.is_empty() {
            return None;
        }
        let successes = recent.iter().filter(|e| e.success).count();
        Some(successes as f64 / recent.len() as f64)
    }
}
