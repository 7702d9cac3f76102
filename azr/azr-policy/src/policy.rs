//! Weighted controller selection with reward feedback.

use std::collections::BTreeMap;

use azr_types::{AzrError, Result, TaskParameters};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mode::SelectionMode;
use crate::performance::ControllerPerformance;

/// Tunables for [`SelectionPolicy`].
///
/// # Example
///
/// ```
/// use azr_policy::PolicyConfig;
///
/// let config = PolicyConfig::default().with_learning_rate(0.2).with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seed, Some(7));
/// ```
/// Lowest selection-weight floor a policy accepts.
///
/// Every weight stays at or above this value, so no controller's selection
/// probability can collapse to zero.
pub const MIN_WEIGHT_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Step size applied to each reward.
    pub learning_rate: f64,

    /// Weight given to a newly registered controller.
    pub initial_weight: f64,

    /// Floor below which no weight can fall; at least [`MIN_WEIGHT_FLOOR`].
    pub min_weight: f64,

    /// Probability of drawing from the task-type success list in
    /// [`SelectionMode::MatchTask`].
    pub match_task_bias: f64,

    /// Random seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            initial_weight: 1.0,
            min_weight: 0.1,
            match_task_bias: 0.7,
            seed: None,
        }
    }
}

impl PolicyConfig {
    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the match-task bias.
    #[must_use]
    pub const fn with_match_task_bias(mut self, bias: f64) -> Self {
        self.match_task_bias = bias;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] for a floor below
    /// [`MIN_WEIGHT_FLOOR`], an initial weight below the floor, a negative or non-finite learning
    /// rate, or a bias outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(AzrError::configuration(format!(
                "learning rate must be finite and >= 0 (got {})",
                self.learning_rate
            )));
        }
        if !self.min_weight.is_finite() || self.min_weight < MIN_WEIGHT_FLOOR {
            return Err(AzrError::configuration(format!(
                "minimum weight must be >= {MIN_WEIGHT_FLOOR} (got {})",
                self.min_weight
            )));
        }
        if !self.initial_weight.is_finite() || self.initial_weight < self.min_weight {
            return Err(AzrError::configuration(format!(
                "initial weight {} is below the minimum weight {}",
                self.initial_weight, self.min_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.match_task_bias) {
            return Err(AzrError::configuration(format!(
                "match-task bias must lie in [0, 1] (got {})",
                self.match_task_bias
            )));
        }
        Ok(())
    }
}

/// What the policy knows about the task being served.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Task category.
    pub task_type: &'a str,
}

impl<'a> SelectionContext<'a> {
    /// Context for a task type.
    #[must_use]
    pub const fn new(task_type: &'a str) -> Self {
        Self { task_type }
    }

    /// Context for a task.
    #[must_use]
    pub fn for_task(task: &'a TaskParameters) -> Self {
        Self {
            task_type: &task.task_type,
        }
    }
}

/// Controller selection policy.
///
/// Keeps one weight per controller, updated as
/// `w ← max(min_weight, w + learning_rate · reward)`, and a map from task
/// type to the controllers that succeeded on it. The map keeps duplicates,
/// so [`SelectionMode::MatchTask`] samples uniformly *with repetition*:
/// a controller with more recorded successes for a type is drawn more
/// often.
///
/// # Example
///
/// ```
/// use azr_policy::{PolicyConfig, SelectionContext, SelectionMode, SelectionPolicy};
///
/// let mut policy = SelectionPolicy::new(3, PolicyConfig::default().with_seed(1))
///     .unwrap_or_else(|_| unreachable!());
///
/// let ctx = SelectionContext::new("navigation");
/// let first = policy.select(SelectionMode::Sequential, ctx).unwrap_or_default();
/// let second = policy.select(SelectionMode::Sequential, ctx).unwrap_or_default();
/// assert_eq!((first, second), (0, 1));
///
/// policy.update(second, 1.0, "navigation", true).unwrap_or_default();
/// assert!((policy.weight(1).unwrap_or_default() - 1.1).abs() < 1e-12);
/// assert_eq!(policy.successful_controllers("navigation"), &[1]);
/// ```
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    config: PolicyConfig,
    weights: Vec<f64>,
    performance: Vec<ControllerPerformance>,
    task_type_successes: BTreeMap<String, Vec<usize>>,
    sequential_calls: usize,
    rng: StdRng,
}

impl SelectionPolicy {
    /// Creates a policy over `pool_size` controllers.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if `config` is invalid.
    pub fn new(pool_size: usize, config: PolicyConfig) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            config,
            weights: vec![config.initial_weight; pool_size],
            performance: vec![ControllerPerformance::default(); pool_size],
            task_type_successes: BTreeMap::new(),
            sequential_calls: 0,
            rng,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Number of controllers in the pool.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.weights.len()
    }

    /// Adds a controller at the initial weight and returns its index.
    pub fn register_controller(&mut self) -> usize {
        self.weights.push(self.config.initial_weight);
        self.performance.push(ControllerPerformance::default());
        self.weights.len() - 1
    }

    /// Current weights, indexed by controller.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight of one controller.
    #[must_use]
    pub fn weight(&self, index: usize) -> Option<f64> {
        self.weights.get(index).copied()
    }

    /// Weights normalized to sum to 1.
    #[must_use]
    pub fn probabilities(&self) -> Vec<f64> {
        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.weights.len()];
        }
        self.weights.iter().map(|w| w / total).collect()
    }

    /// Performance record of one controller.
    #[must_use]
    pub fn performance(&self, index: usize) -> Option<&ControllerPerformance> {
        self.performance.get(index)
    }

    /// Controllers that succeeded on `task_type`, in recording order.
    #[must_use]
    pub fn successful_controllers(&self, task_type: &str) -> &[usize] {
        self.task_type_successes
            .get(task_type)
            .map_or(&[], Vec::as_slice)
    }

    /// The full task-type success map.
    #[must_use]
    pub const fn task_type_map(&self) -> &BTreeMap<String, Vec<usize>> {
        &self.task_type_successes
    }

    /// Restores every weight to the initial value.
    pub fn reset_weights(&mut self) {
        self.weights.fill(self.config.initial_weight);
    }

    /// Draws a controller index.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::NoControllersAvailable`] if the pool is empty.
    pub fn select(&mut self, mode: SelectionMode, context: SelectionContext<'_>) -> Result<usize> {
        if self.weights.is_empty() {
            return Err(AzrError::no_controllers(format!(
                "cannot select a controller for task type '{}' from an empty pool",
                context.task_type
            )));
        }

        let index = match mode {
            SelectionMode::Sequential => {
                let index = self.sequential_calls % self.weights.len();
                self.sequential_calls += 1;
                index
            }
            SelectionMode::Random => self.sample_weighted()?,
            SelectionMode::MatchTask => match self.sample_task_match(context.task_type) {
                Some(index) => index,
                None => self.sample_weighted()?,
            },
        };

        debug!(
            mode = %mode,
            task_type = context.task_type,
            controller = index,
            "selected controller"
        );
        Ok(index)
    }

    /// Applies reward feedback for one episode.
    ///
    /// Nothing is mutated when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::UnknownController`] for an index outside the pool
    /// and [`AzrError::InvalidMetric`] for a non-finite reward.
    pub fn update(
        &mut self,
        controller_index: usize,
        reward: f64,
        task_type: &str,
        success: bool,
    ) -> Result<()> {
        let pool_size = self.weights.len();
        if controller_index >= pool_size {
            warn!(
                controller = controller_index,
                pool_size, "ignoring feedback for unknown controller"
            );
            return Err(AzrError::UnknownController {
                index: controller_index,
                pool_size,
            });
        }
        if !reward.is_finite() {
            return Err(AzrError::invalid_metric(format!(
                "reward for controller {controller_index} is not finite ({reward})"
            )));
        }

        let old_weight = self.weights[controller_index];
        let new_weight = (old_weight + self.config.learning_rate * reward).max(self.config.min_weight);
        self.weights[controller_index] = new_weight;

        let performance = &mut self.performance[controller_index];
        performance.record(task_type, reward, success);

        if success {
            self.task_type_successes
                .entry(task_type.to_string())
                .or_default()
                .push(controller_index);
        }

        debug!(
            controller = controller_index,
            task_type,
            reward,
            old_weight,
            new_weight,
            mean_reward = performance.overall.mean_reward().unwrap_or_default(),
            success_rate = performance.overall.success_rate().unwrap_or_default(),
            "applied selection feedback"
        );
        Ok(())
    }

    fn sample_weighted(&mut self) -> Result<usize> {
        let dist = WeightedIndex::new(&self.weights)
            .map_err(|e| AzrError::invalid_metric(format!("selection weights rejected: {e}")))?;
        Ok(dist.sample(&mut self.rng))
    }

    fn sample_task_match(&mut self, task_type: &str) -> Option<usize> {
        let successes = self.task_type_successes.get(task_type)?;
        if successes.is_empty() || !self.rng.gen_bool(self.config.match_task_bias) {
            return None;
        }
        let pick = self.rng.gen_range(0..successes.len());
        Some(successes[pick])
    }
}
