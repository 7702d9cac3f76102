//! The proposal source contract.

use azr_types::{Evaluation, ExecutionResult, LearningContext, Result, TaskParameters};

/// Controller code together with its index in the source's pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerArtifact {
    /// Position in the controller pool.
    pub index: usize,
    /// Controller code, specialized to one task.
    pub code: String,
}

impl ControllerArtifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(index: usize, code: impl Into<String>) -> Self {
        Self {
            index,
            code: code.into(),
        }
    }
}

/// Supplies tasks and controller code, and learns from their outcomes.
///
/// Stands in for a foundation model. The learning loop drives every
/// episode through these calls in order: propose, generate, evaluate,
/// reinforce, update.
pub trait ProposalSource {
    /// Proposes the next task.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::InvalidTask`](azr_types::AzrError::InvalidTask)
    /// if no well-formed task can be produced.
    fn propose_task(&mut self, context: &LearningContext<'_>) -> Result<TaskParameters>;

    /// Produces controller code for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::NoControllersAvailable`](azr_types::AzrError::NoControllersAvailable)
    /// if the pool is empty and
    /// [`AzrError::InvalidController`](azr_types::AzrError::InvalidController)
    /// if the code cannot be produced.
    fn generate_controller_code(&mut self, task: &TaskParameters) -> Result<ControllerArtifact>;

    /// Scores an execution qualitatively.
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be scored.
    fn evaluate_controller(
        &mut self,
        task: &TaskParameters,
        code: &str,
        result: &ExecutionResult,
    ) -> Result<Evaluation>;

    /// Feeds the episode reward back into controller selection.
    ///
    /// # Errors
    ///
    /// Returns [`AzrError::UnknownController`](azr_types::AzrError::UnknownController)
    /// for an artifact outside the pool and
    /// [`AzrError::InvalidMetric`](azr_types::AzrError::InvalidMetric) for
    /// a non-finite reward.
    fn apply_reinforcement_feedback(
        &mut self,
        task: &TaskParameters,
        artifact: &ControllerArtifact,
        reward: f64,
        success: bool,
    ) -> Result<()>;

    /// Records the evaluation of an episode.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    fn update_learning(&mut self, task: &TaskParameters, code: &str, evaluation: &Evaluation) -> Result<()>;
}
