//! In-process stand-in for a foundation-model proposal source.

use std::collections::BTreeMap;

use azr_policy::{PolicyConfig, SelectionContext, SelectionPolicy};
use azr_types::{
    AzrError, Difficulty, Evaluation, ExecutionResult, LearningContext, Result, TaskParameters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{ProposalConfig, TaskSelectionMode};
use crate::defaults::{apply_task_to_controller, default_controllers, default_tasks};
use crate::source::{ControllerArtifact, ProposalSource};

/// Randomization range factor applied at each difficulty.
#[must_use]
pub const fn range_factor(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 0.5,
        Difficulty::Medium => 1.0,
        Difficulty::Hard => 1.5,
    }
}

/// Qualitative score of an execution, in [0, 1].
///
/// Starts at 1 for success and 0 for failure, blends in time efficiency
/// `min(1, 10 / max(1, t))` at 0.3 weight, then path efficiency at 0.2
/// weight. Each blend is skipped when its metric is absent.
#[must_use]
pub fn score_execution(result: &ExecutionResult) -> f64 {
    let mut score = if result.success { 1.0 } else { 0.0 };
    if let Some(t) = result.metrics.time_to_completion {
        let time_factor = (10.0 / t.max(1.0)).min(1.0);
        score = score * 0.7 + time_factor * 0.3;
    }
    if let Some(p) = result.metrics.path_efficiency {
        score = score * 0.8 + p.clamp(0.0, 1.0) * 0.2;
    }
    score
}

/// One evaluated episode as seen by the proposal source.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    /// Task id.
    pub task_id: String,
    /// Task description.
    pub task_description: String,
    /// Whether the controller succeeded.
    pub success: bool,
    /// Evaluation score.
    pub score: f64,
}

/// Mock proposal source backed by fixed task and controller pools.
///
/// Tasks are cloned from templates, given fresh `mock_task_xxxxxxxx`
/// ids, and have their randomization ranges scaled to the current
/// difficulty. Controllers are drawn by a [`SelectionPolicy`] and have
/// their placeholders filled from the task.
#[derive(Debug)]
pub struct MockProposalSource {
    config: ProposalConfig,
    tasks: Vec<TaskParameters>,
    controllers: Vec<String>,
    policy: SelectionPolicy,
    task_counter: usize,
    last_selected: BTreeMap<String, usize>,
    learning_log: Vec<FeedbackRecord>,
    rng: StdRng,
}

impl MockProposalSource {
    /// Creates a source over the built-in tasks and controllers.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if either configuration is invalid.
    pub fn new(config: ProposalConfig, policy: PolicyConfig) -> Result<Self> {
        Self::with_pools(config, policy, default_tasks(), default_controllers())
    }

    /// Creates a source over custom pools.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] for an empty task pool or an
    /// invalid configuration, and [`AzrError::NoControllersAvailable`] for
    /// an empty controller pool.
    pub fn with_pools(
        config: ProposalConfig,
        policy: PolicyConfig,
        tasks: Vec<TaskParameters>,
        controllers: Vec<String>,
    ) -> Result<Self> {
        config.validate()?;
        if tasks.is_empty() {
            return Err(AzrError::configuration("mock proposal source has no task templates"));
        }
        if controllers.is_empty() {
            return Err(AzrError::no_controllers(
                "mock proposal source has no controller templates",
            ));
        }

        // Derive the policy seed from the source seed unless one is given.
        let policy = match (policy.seed, config.seed) {
            (None, Some(seed)) => policy.with_seed(seed.wrapping_add(1)),
            _ => policy,
        };
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        info!(
            tasks = tasks.len(),
            controllers = controllers.len(),
            task_selection = %config.task_selection,
            controller_selection = %config.controller_selection,
            "initialized mock proposal source"
        );

        Ok(Self {
            policy: SelectionPolicy::new(controllers.len(), policy)?,
            config,
            tasks,
            controllers,
            task_counter: 0,
            last_selected: BTreeMap::new(),
            learning_log: Vec::new(),
            rng,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProposalConfig {
        &self.config
    }

    /// The controller selection policy.
    #[must_use]
    pub const fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Task templates.
    #[must_use]
    pub fn tasks(&self) -> &[TaskParameters] {
        &self.tasks
    }

    /// Controller templates.
    #[must_use]
    pub fn controllers(&self) -> &[String] {
        &self.controllers
    }

    /// Controller index last generated for a task.
    #[must_use]
    pub fn last_selected(&self, task_id: &str) -> Option<usize> {
        self.last_selected.get(task_id).copied()
    }

    /// Every evaluation recorded through `update_learning`.
    #[must_use]
    pub fn learning_log(&self) -> &[FeedbackRecord] {
        &self.learning_log
    }

    fn select_template(&mut self, difficulty: Difficulty) -> TaskParameters {
        let index = match self.config.task_selection {
            TaskSelectionMode::Sequential => {
                let index = self.task_counter % self.tasks.len();
                self.task_counter += 1;
                index
            }
            TaskSelectionMode::Random => self.rng.gen_range(0..self.tasks.len()),
            TaskSelectionMode::Difficulty => {
                let matching: Vec<usize> = (0..self.tasks.len())
                    .filter(|&i| self.tasks[i].difficulty == difficulty)
                    .collect();
                if matching.is_empty() {
                    self.rng.gen_range(0..self.tasks.len())
                } else {
                    matching[self.rng.gen_range(0..matching.len())]
                }
            }
        };
        self.tasks[index].clone()
    }

    fn fresh_task_id(&mut self, previous: &[String]) -> String {
        loop {
            let id = format!("mock_task_{:08x}", self.rng.gen_range(0..=u32::MAX));
            if !previous.contains(&id) {
                return id;
            }
        }
    }
}

impl ProposalSource for MockProposalSource {
    fn propose_task(&mut self, context: &LearningContext<'_>) -> Result<TaskParameters> {
        let mut task = self.select_template(context.difficulty);
        task.task_id = self.fresh_task_id(context.previous_task_ids);
        task.domain_randomization = task
            .domain_randomization
            .scaled(range_factor(context.difficulty));

        info!(
            task_id = %task.task_id,
            task_type = %task.task_type,
            difficulty = %context.difficulty,
            description = %task.task_description,
            "proposed task"
        );
        Ok(task)
    }

    fn generate_controller_code(&mut self, task: &TaskParameters) -> Result<ControllerArtifact> {
        let mode = self.config.controller_selection;
        let index = self.policy.select(mode, SelectionContext::for_task(task))?;
        let template = self.controllers.get(index).ok_or_else(|| {
            AzrError::invalid_controller(format!("policy selected controller {index} outside the pool"))
        })?;
        let code = apply_task_to_controller(template, task);
        self.last_selected.insert(task.task_id.clone(), index);

        info!(
            task_id = %task.task_id,
            controller = index,
            mode = %mode,
            code_len = code.len(),
            "generated controller code"
        );
        Ok(ControllerArtifact::new(index, code))
    }

    fn evaluate_controller(
        &mut self,
        task: &TaskParameters,
        _code: &str,
        result: &ExecutionResult,
    ) -> Result<Evaluation> {
        let score = score_execution(result);
        let (feedback, suggestions) = match (result.success, score < 0.8) {
            (false, _) => (
                "The controller failed to complete the task.",
                vec![
                    "Consider implementing error recovery strategies.".to_string(),
                    "Try using a more robust control algorithm.".to_string(),
                ],
            ),
            (true, true) => (
                "The controller successfully completed the task.",
                vec![
                    "The controller could be optimized for better efficiency.".to_string(),
                    "Consider adding smoothing to the trajectory.".to_string(),
                ],
            ),
            (true, false) => ("The controller successfully completed the task.", Vec::new()),
        };

        info!(task_id = %task.task_id, success = result.success, score, "evaluated controller");
        Ok(Evaluation {
            success: result.success,
            score,
            feedback: feedback.to_string(),
            suggestions,
        })
    }

    fn apply_reinforcement_feedback(
        &mut self,
        task: &TaskParameters,
        artifact: &ControllerArtifact,
        reward: f64,
        success: bool,
    ) -> Result<()> {
        if self.last_selected(&task.task_id) != Some(artifact.index) {
            warn!(
                task_id = %task.task_id,
                controller = artifact.index,
                "feedback for a controller this source did not generate for the task"
            );
        }
        self.policy
            .update(artifact.index, reward, &task.task_type, success)?;

        if let Some(perf) = self.policy.performance(artifact.index) {
            let by_type = perf.for_task_type(&task.task_type).copied().unwrap_or_default();
            info!(
                task_id = %task.task_id,
                controller = artifact.index,
                reward,
                weight = self.policy.weight(artifact.index).unwrap_or_default(),
                mean_reward = perf.overall.mean_reward().unwrap_or_default(),
                success_rate = perf.overall.success_rate().unwrap_or_default(),
                task_type_successes = by_type.success_count,
                task_type_episodes = by_type.episodes,
                "applied reinforcement feedback"
            );
        }
        Ok(())
    }

    fn update_learning(&mut self, task: &TaskParameters, _code: &str, evaluation: &Evaluation) -> Result<()> {
        self.learning_log.push(FeedbackRecord {
            task_id: task.task_id.clone(),
            task_description: task.task_description.clone(),
            success: evaluation.success,
            score: evaluation.score,
        });
        debug!(entries = self.learning_log.len(), "learning log updated");
        Ok(())
    }
}
