//! Per-controller performance bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    /// Episodes recorded.
    pub episodes: usize,
    /// Sum of rewards.
    pub cumulative_reward: f64,
    /// Successful episodes.
    pub success_count: usize,
}

impl OutcomeStats {
    fn record(&mut self, reward: f64, success: bool) {
        self.episodes += 1;
        self.cumulative_reward += reward;
        if success {
            self.success_count += 1;
        }
    }

    /// Mean reward, or `None` before the first episode.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_reward(&self) -> Option<f64> {
        (self.episodes > 0).then(|| self.cumulative_reward / self.episodes as f64)
    }

    /// Fraction of successful episodes, or `None` before the first episode.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        (self.episodes > 0).then(|| self.success_count as f64 / self.episodes as f64)
    }
}

/// Performance record for one controller in the pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerPerformance {
    /// Totals across every task type.
    pub overall: OutcomeStats,
    /// Totals per task type.
    pub by_task_type: BTreeMap<String, OutcomeStats>,
}

impl ControllerPerformance {
    /// Records one episode.
    pub fn record(&mut self, task_type: &str, reward: f64, success: bool) {
        self.overall.record(reward, success);
        self.by_task_type
            .entry(task_type.to_string())
            .or_default()
            .record(reward, success);
    }

    /// Sum of rewards across all episodes.
    #[must_use]
    pub const fn cumulative_reward(&self) -> f64 {
        self.overall.cumulative_reward
    }

    /// Successful episodes across all task types.
    #[must_use]
    pub const fn success_count(&self) -> usize {
        self.overall.success_count
    }

    /// Stats for one task type.
    #[must_use]
    pub fn for_task_type(&self, task_type: &str) -> Option<&OutcomeStats> {
        self.by_task_type.get(task_type)
    }
}
