//! Reward calculation from execution results.

use azr_types::{AzrError, Difficulty, ExecutionMetrics, ExecutionResult, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base reward for a successful run.
pub const SUCCESS_REWARD: f64 = 1.0;

/// Base reward for a failed run.
pub const FAILURE_REWARD: f64 = -1.0;

/// Maximum bonus for completing quickly.
pub const TIME_BONUS_MAX: f64 = 0.5;

/// Maximum bonus for a direct path.
pub const PATH_BONUS_MAX: f64 = 0.3;

/// Maximum bonus for low actuation effort.
pub const ENERGY_BONUS_MAX: f64 = 0.2;

/// Completion time (seconds) at or below which time efficiency is 1.
pub const TIME_REFERENCE_SECS: f64 = 10.0;

/// Lower clamp on completion time (seconds) before normalizing.
pub const TIME_FLOOR_SECS: f64 = 1.0;

/// How missing metrics are treated on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricPolicy {
    /// A missing metric is an [`AzrError::InvalidMetric`].
    #[default]
    Strict,
    /// A missing metric contributes no bonus.
    DefaultToZero,
}

/// Shape of the reward signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// Base term plus efficiency bonuses.
    #[default]
    Shaped,
    /// Base term only.
    Binary,
}

/// Every term that went into a reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// +1 on success, -1 on failure.
    pub base: f64,
    /// Time-efficiency bonus.
    pub time_bonus: f64,
    /// Path-efficiency bonus.
    pub path_bonus: f64,
    /// Energy-efficiency bonus.
    pub energy_bonus: f64,
    /// Difficulty multiplier.
    pub multiplier: f64,
}

impl RewardBreakdown {
    /// Final scaled reward.
    #[must_use]
    pub fn total(&self) -> f64 {
        (self.base + self.time_bonus + self.path_bonus + self.energy_bonus) * self.multiplier
    }
}

/// Maps execution results to scalar rewards.
///
/// Pure: identical inputs always produce bit-identical outputs.
///
/// # Example
///
/// ```
/// use azr_reward::{MetricPolicy, RewardCalculator};
/// use azr_types::{Difficulty, ExecutionMetrics, ExecutionResult};
///
/// let calc = RewardCalculator::new(MetricPolicy::Strict);
/// let result = ExecutionResult::succeeded(ExecutionMetrics::new(0.5, 1.0, 1.0));
/// let reward = calc.calculate(&result, Difficulty::Medium).unwrap_or_default();
/// assert!((reward - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCalculator {
    /// Missing-metric policy.
    pub policy: MetricPolicy,
    /// Reward shape.
    pub reward_type: RewardType,
}

impl RewardCalculator {
    /// Creates a shaped-reward calculator with the given policy.
    #[must_use]
    pub const fn new(policy: MetricPolicy) -> Self {
        Self {
            policy,
            reward_type: RewardType::Shaped,
        }
    }

    /// Sets the reward type.
    #[must_use]
    pub const fn with_reward_type(mut self, reward_type: RewardType) -> Self {
        self.reward_type = reward_type;
        self
    }

    /// Computes each reward term.
    ///
    /// Bonuses only apply to successful runs, so metrics are only
    /// inspected when `result.success` is true.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::InvalidMetric`] if a successful run carries a
    /// non-finite or negative metric, or lacks one under
    /// [`MetricPolicy::Strict`].
    pub fn breakdown(
        &self,
        result: &ExecutionResult,
        difficulty: Difficulty,
    ) -> Result<RewardBreakdown> {
        let mut terms = RewardBreakdown {
            base: if result.success {
                SUCCESS_REWARD
            } else {
                FAILURE_REWARD
            },
            time_bonus: 0.0,
            path_bonus: 0.0,
            energy_bonus: 0.0,
            multiplier: difficulty.multiplier(),
        };

        if result.success && self.reward_type == RewardType::Shaped {
            let efficiencies = self.efficiencies(&result.metrics)?;
            terms.time_bonus = TIME_BONUS_MAX * efficiencies.time;
            terms.path_bonus = PATH_BONUS_MAX * efficiencies.path;
            terms.energy_bonus = ENERGY_BONUS_MAX * efficiencies.energy;
        }

        debug!(
            base = terms.base,
            time_bonus = terms.time_bonus,
            path_bonus = terms.path_bonus,
            energy_bonus = terms.energy_bonus,
            difficulty = %difficulty,
            multiplier = terms.multiplier,
            "reward terms"
        );

        Ok(terms)
    }

    /// Computes the scaled reward.
    ///
    /// # Errors
    ///
    /// See [`RewardCalculator::breakdown`].
    pub fn calculate(&self, result: &ExecutionResult, difficulty: Difficulty) -> Result<f64> {
        self.breakdown(result, difficulty).map(|b| b.total())
    }

    /// Computes the reward squashed into [-1, 1].
    ///
    /// # Errors
    ///
    /// See [`RewardCalculator::breakdown`].
    pub fn calculate_normalized(
        &self,
        result: &ExecutionResult,
        difficulty: Difficulty,
    ) -> Result<f64> {
        self.calculate(result, difficulty).map(normalize_reward)
    }

    fn efficiencies(&self, metrics: &ExecutionMetrics) -> Result<Efficiencies> {
        let time = self
            .require("time_to_completion", metrics.time_to_completion)?
            .map(|t| {
                if t < 0.0 {
                    Err(AzrError::invalid_metric(format!(
                        "time_to_completion is negative ({t})"
                    )))
                } else {
                    Ok(time_efficiency(t))
                }
            })
            .transpose()?
            .unwrap_or(0.0);
        let path = self
            .require("path_efficiency", metrics.path_efficiency)?
            .map_or(0.0, clamp_unit);
        let energy = self
            .require("energy_efficiency", metrics.energy_efficiency)?
            .map_or(0.0, clamp_unit);

        Ok(Efficiencies { time, path, energy })
    }

    fn require(&self, name: &str, value: Option<f64>) -> Result<Option<f64>> {
        match value {
            Some(v) if !v.is_finite() => Err(AzrError::invalid_metric(format!(
                "{name} is not finite ({v})"
            ))),
            Some(v) => Ok(Some(v)),
            None => match self.policy {
                MetricPolicy::Strict => Err(AzrError::invalid_metric(format!(
                    "required metric '{name}' is missing"
                ))),
                MetricPolicy::DefaultToZero => Ok(None),
            },
        }
    }
}

struct Efficiencies {
    time: f64,
    path: f64,
    energy: f64,
}

/// Normalizes a completion time into [0, 1].
///
/// Times at or below [`TIME_REFERENCE_SECS`] score 1; longer runs decay as
/// `reference / t`.
#[must_use]
pub fn time_efficiency(time_to_completion: f64) -> f64 {
    (TIME_REFERENCE_SECS / time_to_completion.max(TIME_FLOOR_SECS)).min(1.0)
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Squashes a raw reward into [-1, 1] with `tanh`.
#[must_use]
pub fn normalize_reward(raw: f64) -> f64 {
    raw.tanh()
}

/// Computes a shaped reward, failing on missing metrics.
///
/// # Errors
///
/// Returns [`AzrError::InvalidMetric`] for missing or non-finite metrics on
/// a successful run.
pub fn calculate_reward(result: &ExecutionResult, difficulty: Difficulty) -> Result<f64> {
    RewardCalculator::new(MetricPolicy::Strict).calculate(result, difficulty)
}

/// Computes a shaped reward squashed into [-1, 1].
///
/// # Errors
///
/// See [`calculate_reward`].
pub fn calculate_normalized_reward(
    result: &ExecutionResult,
    difficulty: Difficulty,
) -> Result<f64> {
    calculate_reward(result, difficulty).map(normalize_reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn perfect() -> ExecutionResult {
        ExecutionResult::succeeded(ExecutionMetrics::new(0.5, 1.0, 1.0))
    }

    #[test]
    fn perfect_success_scales_with_difficulty() {
        for level in Difficulty::ALL {
            let reward = calculate_reward(&perfect(), level).unwrap_or(f64::NAN);
            assert_relative_eq!(reward, 2.0 * level.multiplier(), epsilon = 1e-12);
        }
    }

    #[test]
    fn failure_is_minus_multiplier() {
        let result = ExecutionResult::unsuccessful(ExecutionMetrics::new(100.0, 0.0, 0.0));
        for level in Difficulty::ALL {
            let reward = calculate_reward(&result, level).unwrap_or(f64::NAN);
            assert_relative_eq!(reward, -level.multiplier(), epsilon = 1e-12);
        }
    }

    #[test]
    fn failure_ignores_missing_metrics() {
        let result = ExecutionResult::failed("crashed");
        let reward = calculate_reward(&result, Difficulty::Hard).unwrap_or(f64::NAN);
        assert_relative_eq!(reward, -1.2, epsilon = 1e-12);
    }

    #[test]
    fn partial_bonuses() {
        // 20 s → time efficiency 0.5 → bonus 0.25
        let result = ExecutionResult::succeeded(ExecutionMetrics::new(20.0, 0.5, 0.25));
        let Ok(terms) = RewardCalculator::default().breakdown(&result, Difficulty::Medium) else {
            panic!("breakdown failed for a complete success");
        };
        assert_relative_eq!(terms.time_bonus, 0.25, epsilon = 1e-12);
        assert_relative_eq!(terms.path_bonus, 0.15, epsilon = 1e-12);
        assert_relative_eq!(terms.energy_bonus, 0.05, epsilon = 1e-12);
        assert_relative_eq!(terms.total(), 1.45, epsilon = 1e-12);
    }

    #[test]
    fn efficiencies_are_capped() {
        let result = ExecutionResult::succeeded(ExecutionMetrics::new(0.0, 3.0, 7.5));
        let reward = calculate_reward(&result, Difficulty::Medium).unwrap_or(f64::NAN);
        assert_relative_eq!(reward, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn strict_policy_rejects_missing_metric() {
        let mut result = perfect();
        result.metrics.energy_efficiency = None;
        let err = calculate_reward(&result, Difficulty::Easy);
        assert!(matches!(err, Err(AzrError::InvalidMetric(msg)) if msg.contains("energy_efficiency")));
    }

    #[test]
    fn default_policy_treats_missing_metric_as_zero() {
        let mut result = perfect();
        result.metrics.energy_efficiency = None;
        result.metrics.time_to_completion = None;
        let calc = RewardCalculator::new(MetricPolicy::DefaultToZero);
        let reward = calc.calculate(&result, Difficulty::Medium).unwrap_or(f64::NAN);
        assert_relative_eq!(reward, 1.3, epsilon = 1e-12);
    }

    #[test]
    fn non_finite_metric_rejected_under_both_policies() {
        let result = ExecutionResult::succeeded(ExecutionMetrics::new(1.0, f64::NAN, 0.5));
        for policy in [MetricPolicy::Strict, MetricPolicy::DefaultToZero] {
            let err = RewardCalculator::new(policy).calculate(&result, Difficulty::Medium);
            assert!(matches!(err, Err(AzrError::InvalidMetric(_))));
        }
    }

    #[test]
    fn negative_time_rejected() {
        let result = ExecutionResult::succeeded(ExecutionMetrics::new(-1.0, 0.5, 0.5));
        assert!(calculate_reward(&result, Difficulty::Medium).is_err());
    }

    #[test]
    fn binary_reward_ignores_bonuses() {
        let calc = RewardCalculator::default().with_reward_type(RewardType::Binary);
        let reward = calc.calculate(&perfect(), Difficulty::Hard).unwrap_or(f64::NAN);
        assert_relative_eq!(reward, 1.2, epsilon = 1e-12);
    }

    #[test]
    fn reward_is_bit_identical_across_calls() {
        let result = ExecutionResult::succeeded(ExecutionMetrics::new(3.7, 0.61, 0.42));
        let a = calculate_reward(&result, Difficulty::Hard).unwrap_or(f64::NAN);
        let b = calculate_reward(&result, Difficulty::Hard).unwrap_or(f64::NAN);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn normalized_reward_matches_tanh() {
        let normalized = calculate_normalized_reward(&perfect(), Difficulty::Medium)
            .unwrap_or(f64::NAN);
        assert_relative_eq!(normalized, 2.0_f64.tanh(), epsilon = 1e-12);
    }

    #[test]
    fn time_efficiency_curve() {
        assert_relative_eq!(time_efficiency(0.0), 1.0);
        assert_relative_eq!(time_efficiency(10.0), 1.0);
        assert_relative_eq!(time_efficiency(40.0), 0.25);
    }

    #[test]
    fn reward_config_uses_snake_case_names() {
        let calc = RewardCalculator::new(MetricPolicy::DefaultToZero);
        let json = serde_json::to_value(calc).unwrap_or_default();
        assert_eq!(json["policy"], "default_to_zero");
        assert_eq!(json["reward_type"], "shaped");
    }
}
