//! The self-play learning loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use azr_proposal::{ControllerArtifact, ProposalSource};
use azr_reward::RewardCalculator;
use azr_sim::SimulationExecutor;
use azr_types::{
    AzrError, Difficulty, Evaluation, ExecutionResult, LearningContext, LearningEvent, Result,
    TaskParameters,
};
use tracing::{debug, error, info, warn};

use crate::config::{GrootzeroConfig, MAX_EPISODE_CEILING};
use crate::difficulty::DifficultySchedule;

/// Where the loop currently is within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopPhase {
    /// Constructed, not yet initialized.
    Idle,
    /// Initializing the executor.
    Initializing,
    /// Waiting on a task proposal.
    ProposingTask,
    /// Waiting on controller code.
    GeneratingController,
    /// Running the controller.
    ExecutingSimulation,
    /// Scoring the run and computing the reward.
    Evaluating,
    /// Feeding the reward back to the proposal source.
    UpdatingFeedback,
    /// Recording history and adjusting difficulty.
    AdjustingDifficulty,
    /// The run has ended.
    Done,
}

/// Cooperative cancellation flag, checked between episodes.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of episodes was attempted.
    BudgetExhausted,
    /// The request exceeded the episode ceiling.
    CeilingReached,
    /// A [`CancelToken`] was triggered.
    Cancelled,
}

/// Everything one completed episode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    /// Episode number (0-indexed).
    pub episode: usize,
    /// The task that was run.
    pub task: TaskParameters,
    /// Controller pool index.
    pub controller_index: usize,
    /// Execution result, synthetic if the controller crashed.
    pub result: ExecutionResult,
    /// Qualitative evaluation.
    pub evaluation: Evaluation,
    /// Reward fed back to the policy.
    pub reward: f64,
    /// Difficulty the episode ran at.
    pub difficulty: Difficulty,
    /// New difficulty, if this episode changed it.
    pub difficulty_change: Option<Difficulty>,
}

/// An episode that ended early without a history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AbortedEpisode {
    /// Episode number (0-indexed).
    pub episode: usize,
    /// Task id, if a task was proposed.
    pub task_id: Option<String>,
    /// Controller index, if code was generated.
    pub controller_index: Option<usize>,
    /// The error that aborted the episode.
    pub error: AzrError,
}

/// Result of [`LearningLoop::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Completed episodes, in order.
    pub completed: Vec<EpisodeOutcome>,
    /// Aborted episodes, in order.
    pub aborted: Vec<AbortedEpisode>,
    /// Why the run stopped.
    pub stop_reason: StopReason,
    /// Difficulty at the end of the run.
    pub final_difficulty: Difficulty,
}

impl RunSummary {
    /// Episodes attempted.
    #[must_use]
    pub fn episodes(&self) -> usize {
        self.completed.len() + self.aborted.len()
    }

    /// Fraction of completed episodes that succeeded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        if self.completed.is_empty() {
            return None;
        }
        let successes = self.completed.iter().filter(|o| o.result.success).count();
        Some(successes as f64 / self.completed.len() as f64)
    }
}

/// What was known about an episode when it failed.
#[derive(Debug, Default)]
struct EpisodeTrace {
    task_id: Option<String>,
    controller_index: Option<usize>,
}

/// Drives the propose, generate, execute, evaluate, reinforce cycle.
///
/// Owns the learning history and the difficulty level. Both are only
/// mutated at the end of a completed episode. The loop never branches on
/// which proposal source or executor it holds.
///
/// # Example
///
/// ```
/// use azr_loop::{GrootzeroConfig, LearningLoop};
/// use azr_proposal::MockProposalSource;
/// use azr_sim::ScriptedExecutor;
///
/// let config = GrootzeroConfig::default().with_seed(3);
/// let source = MockProposalSource::new(config.groot_n1.clone(), config.policy_config())
///     .unwrap_or_else(|e| panic!("{e}"));
/// let mut lp = LearningLoop::new(source, ScriptedExecutor::always_succeed(), &config)
///     .unwrap_or_else(|e| panic!("{e}"));
///
/// let summary = lp.run(Some(2)).unwrap_or_else(|e| panic!("{e}"));
/// assert_eq!(summary.completed.len(), 2);
/// assert_eq!(lp.history().len(), 2);
/// ```
#[derive(Debug)]
pub struct LearningLoop<P, E> {
    proposal: P,
    executor: E,
    reward: RewardCalculator,
    schedule: DifficultySchedule,
    max_episodes: usize,
    phase: LoopPhase,
    initialized: bool,
    episode: usize,
    history: Vec<LearningEvent>,
    previous_task_ids: Vec<String>,
    cancel: CancelToken,
}

impl<P: ProposalSource, E: SimulationExecutor> LearningLoop<P, E> {
    /// Creates a loop over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] if `config` is invalid.
    pub fn new(proposal: P, executor: E, config: &GrootzeroConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            proposal,
            executor,
            reward: config.reward_calculator(),
            schedule: DifficultySchedule::from_config(&config.learning),
            max_episodes: config.azr.max_episodes.min(MAX_EPISODE_CEILING),
            phase: LoopPhase::Idle,
            initialized: false,
            episode: 0,
            history: Vec::new(),
            previous_task_ids: Vec::new(),
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Current difficulty level.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.schedule.level()
    }

    /// Learning history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[LearningEvent] {
        &self.history
    }

    /// Ids of every task proposed so far.
    #[must_use]
    pub fn previous_task_ids(&self) -> &[String] {
        &self.previous_task_ids
    }

    /// Episodes attempted so far, including aborted ones.
    #[must_use]
    pub const fn episodes_attempted(&self) -> usize {
        self.episode
    }

    /// Episode ceiling for this loop.
    #[must_use]
    pub const fn max_episodes(&self) -> usize {
        self.max_episodes
    }

    /// The proposal source.
    #[must_use]
    pub const fn proposal(&self) -> &P {
        &self.proposal
    }

    /// The executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// A handle that cancels this loop between episodes.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Initializes the executor. Called by [`Self::run`] if needed.
    ///
    /// # Errors
    ///
    /// Propagates executor initialization errors.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.phase = LoopPhase::Initializing;
        info!(max_episodes = self.max_episodes, difficulty = %self.difficulty(), "initializing learning loop");
        if let Err(e) = self.executor.initialize() {
            error!(error = %e, "executor initialization failed");
            self.phase = LoopPhase::Done;
            return Err(e);
        }
        self.initialized = true;
        self.phase = LoopPhase::Idle;
        Ok(())
    }

    /// Runs up to `num_episodes` episodes (the configured maximum if `None`).
    ///
    /// Aborted episodes count toward the budget. The request is capped by
    /// the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. Episode-scoped errors are recorded
    /// in the summary instead.
    pub fn run(&mut self, num_episodes: Option<usize>) -> Result<RunSummary> {
        let requested = num_episodes.unwrap_or(self.max_episodes);
        let remaining = self.max_episodes.saturating_sub(self.episode);
        let (budget, mut stop_reason) = if requested > remaining {
            warn!(requested, remaining, "episode request exceeds the ceiling; capping");
            (remaining, StopReason::CeilingReached)
        } else {
            (requested, StopReason::BudgetExhausted)
        };

        self.initialize()?;
        info!(episodes = budget, "starting learning loop");

        let mut completed = Vec::new();
        let mut aborted = Vec::new();
        for _ in 0..budget {
            if self.cancel.is_cancelled() {
                info!(episode = self.episode, "learning loop cancelled");
                stop_reason = StopReason::Cancelled;
                break;
            }

            let episode = self.episode;
            let mut trace = EpisodeTrace::default();
            match self.step_episode(&mut trace) {
                Ok(outcome) => completed.push(outcome),
                Err(e) if e.is_fatal() => {
                    error!(
                        episode,
                        task_id = trace.task_id.as_deref().unwrap_or("-"),
                        controller = ?trace.controller_index,
                        error = %e,
                        "fatal error; stopping run"
                    );
                    self.phase = LoopPhase::Done;
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        episode,
                        task_id = trace.task_id.as_deref().unwrap_or("-"),
                        controller = ?trace.controller_index,
                        error = %e,
                        "episode aborted"
                    );
                    aborted.push(AbortedEpisode {
                        episode,
                        task_id: trace.task_id,
                        controller_index: trace.controller_index,
                        error: e,
                    });
                }
            }
        }

        self.phase = LoopPhase::Done;
        info!(
            completed = completed.len(),
            aborted = aborted.len(),
            difficulty = %self.difficulty(),
            ?stop_reason,
            "learning loop finished"
        );
        Ok(RunSummary {
            completed,
            aborted,
            stop_reason,
            final_difficulty: self.difficulty(),
        })
    }

    /// Runs a single episode.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::Configuration`] once the episode ceiling is
    /// reached, and otherwise any error that aborted the episode.
    pub fn run_episode(&mut self) -> Result<EpisodeOutcome> {
        if self.episode >= self.max_episodes {
            return Err(AzrError::configuration(format!(
                "episode ceiling of {} reached",
                self.max_episodes
            )));
        }
        self.initialize()?;
        let episode = self.episode;
        let mut trace = EpisodeTrace::default();
        let outcome = self.step_episode(&mut trace);
        if let Err(e) = &outcome {
            error!(
                episode,
                task_id = trace.task_id.as_deref().unwrap_or("-"),
                controller = ?trace.controller_index,
                error = %e,
                "episode aborted"
            );
        }
        outcome
    }

    /// Closes the executor.
    ///
    /// # Errors
    ///
    /// Propagates executor errors.
    pub fn close(&mut self) -> Result<()> {
        info!("closing learning loop");
        self.phase = LoopPhase::Done;
        self.executor.close()
    }

    fn step_episode(&mut self, trace: &mut EpisodeTrace) -> Result<EpisodeOutcome> {
        let episode = self.episode;
        self.episode += 1;
        let difficulty = self.difficulty();
        info!(episode = episode + 1, max = self.max_episodes, %difficulty, "running episode");

        self.phase = LoopPhase::ProposingTask;
        let task = {
            let context = LearningContext::new(difficulty, &self.previous_task_ids, &self.history);
            self.proposal.propose_task(&context)?
        };
        trace.task_id = Some(task.task_id.clone());
        task.validate()?;
        self.previous_task_ids.push(task.task_id.clone());

        self.phase = LoopPhase::GeneratingController;
        let artifact = self.proposal.generate_controller_code(&task)?;
        trace.controller_index = Some(artifact.index);
        if artifact.code.trim().is_empty() {
            return Err(AzrError::invalid_controller("generated controller code is empty"));
        }
        debug!(controller = artifact.index, code_len = artifact.code.len(), "controller code received");

        self.phase = LoopPhase::ExecutingSimulation;
        let result = self.execute(episode, &task, &artifact)?;
        info!(
            task_id = %task.task_id,
            controller = artifact.index,
            success = result.success,
            reason = result.failure_reason.as_deref().unwrap_or(""),
            "execution finished"
        );

        self.phase = LoopPhase::Evaluating;
        let (result, reward) = self.compute_reward(episode, &task, result)?;
        let evaluation = self.proposal.evaluate_controller(&task, &artifact.code, &result)?;
        info!(task_id = %task.task_id, score = evaluation.score, reward, "episode scored");

        self.phase = LoopPhase::UpdatingFeedback;
        self.apply_feedback(episode, &task, &artifact, reward, result.success)?;
        if let Err(e) = self
            .proposal
            .update_learning(&task, &artifact.code, &evaluation)
        {
            if e.is_fatal() {
                return Err(e);
            }
            warn!(episode, task_id = %task.task_id, error = %e, "learning update failed");
        }

        self.phase = LoopPhase::AdjustingDifficulty;
        let event = LearningEvent {
            episode,
            task_id: task.task_id.clone(),
            task_description: task.task_description.clone(),
            task_type: task.task_type.clone(),
            controller_index: artifact.index,
            difficulty,
            success: result.success,
            score: evaluation.score,
            reward,
            timestamp: unix_timestamp(),
        };
        let difficulty_change = self.schedule.observe(&event);
        self.history.push(event);

        Ok(EpisodeOutcome {
            episode,
            task,
            controller_index: artifact.index,
            result,
            evaluation,
            reward,
            difficulty,
            difficulty_change,
        })
    }

    /// Runs the controller, converting crashes into failed results.
    fn execute(
        &mut self,
        episode: usize,
        task: &TaskParameters,
        artifact: &ControllerArtifact,
    ) -> Result<ExecutionResult> {
        match self.executor.execute(task, &artifact.code) {
            Ok(result) => Ok(result),
            Err(AzrError::ControllerExecution(reason)) => {
                warn!(
                    episode,
                    task_id = %task.task_id,
                    controller = artifact.index,
                    reason = %reason,
                    "controller execution failed; recording a failed run"
                );
                Ok(ExecutionResult::failed(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Computes the reward.
    ///
    /// A successful run with unusable metrics is downgraded to a failed run
    /// rather than aborting the episode.
    fn compute_reward(
        &self,
        episode: usize,
        task: &TaskParameters,
        result: ExecutionResult,
    ) -> Result<(ExecutionResult, f64)> {
        match self.reward.calculate(&result, task.difficulty) {
            Ok(reward) => Ok((result, reward)),
            Err(AzrError::InvalidMetric(reason)) => {
                warn!(
                    episode,
                    task_id = %task.task_id,
                    reason = %reason,
                    "invalid metrics; marking episode failed"
                );
                let downgraded = ExecutionResult::unsuccessful(result.metrics)
                    .with_failure_reason(format!("invalid metrics: {reason}"));
                let reward = self.reward.calculate(&downgraded, task.difficulty)?;
                Ok((downgraded, reward))
            }
            Err(e) => Err(e),
        }
    }

    fn apply_feedback(
        &mut self,
        episode: usize,
        task: &TaskParameters,
        artifact: &ControllerArtifact,
        reward: f64,
        success: bool,
    ) -> Result<()> {
        match self
            .proposal
            .apply_reinforcement_feedback(task, artifact, reward, success)
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    episode,
                    task_id = %task.task_id,
                    controller = artifact.index,
                    error = %e,
                    "reinforcement feedback ignored"
                );
                Ok(())
            }
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use azr_proposal::MockProposalSource;
    use azr_sim::{ScriptedExecutor, ScriptedOutcome};
    use azr_types::ExecutionMetrics;

    fn mock_loop(executor: ScriptedExecutor) -> LearningLoop<MockProposalSource, ScriptedExecutor> {
        let config = GrootzeroConfig::default().with_seed(11);
        let source = MockProposalSource::new(config.groot_n1.clone(), config.policy_config())
            .unwrap_or_else(|e| panic!("{e}"));
        LearningLoop::new(source, executor, &config).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn starts_idle() {
        let lp = mock_loop(ScriptedExecutor::always_succeed());
        assert_eq!(lp.phase(), LoopPhase::Idle);
        assert_eq!(lp.difficulty(), Difficulty::Medium);
        assert!(lp.history().is_empty());
    }

    #[test]
    fn single_episode_records_history() {
        let mut lp = mock_loop(ScriptedExecutor::always_succeed());
        let outcome = lp.run_episode().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(outcome.episode, 0);
        assert!(outcome.result.success);
        assert!(outcome.reward > 0.0);
        assert_eq!(lp.history().len(), 1);
        assert_eq!(lp.previous_task_ids().len(), 1);
        assert_eq!(lp.phase(), LoopPhase::AdjustingDifficulty);
        assert!(lp.executor().is_initialized());
    }

    #[test]
    fn controller_crash_becomes_failed_run() {
        let mut lp = mock_loop(ScriptedExecutor::new(vec![ScriptedOutcome::Error(
            AzrError::controller_execution("divide by zero"),
        )]));
        let outcome = lp.run_episode().unwrap_or_else(|e| panic!("{e}"));
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.failure_reason.as_deref(), Some("divide by zero"));
        assert!(outcome.reward < 0.0);
        assert_eq!(lp.history().len(), 1);
    }

    #[test]
    fn missing_metrics_downgrade_success() {
        let mut lp = mock_loop(ScriptedExecutor::always_succeed().with_metrics(ExecutionMetrics::default()));
        let outcome = lp.run_episode().unwrap_or_else(|e| panic!("{e}"));
        assert!(!outcome.result.success);
        assert!(
            outcome
                .result
                .failure_reason
                .as_deref()
                .is_some_and(|r| r.starts_with("invalid metrics"))
        );
        assert!(outcome.reward < 0.0);
    }

    #[test]
    fn cancel_token_is_shared() {
        let lp = mock_loop(ScriptedExecutor::always_succeed());
        let token = lp.cancel_token();
        assert!(!token.is_cancelled());
        token.clone().cancel();
        assert!(lp.cancel_token().is_cancelled());
    }

    #[test]
    fn close_closes_executor() {
        let mut lp = mock_loop(ScriptedExecutor::always_succeed());
        assert!(lp.close().is_ok());
        assert!(lp.executor().is_closed());
        assert_eq!(lp.phase(), LoopPhase::Done);
    }
}
