//! Deterministic executor for tests.

use azr_types::{AzrError, ExecutionMetrics, ExecutionResult, Result, TaskParameters};
use tracing::debug;

use crate::executor::SimulationExecutor;

/// One replayed outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    /// Report success with the fixed metrics.
    Success,
    /// Report failure with the fixed metrics.
    Failure,
    /// Return this error from `execute`.
    Error(AzrError),
}

/// Executor that replays a fixed outcome pattern, cycling when exhausted.
///
/// Ignores the task and code entirely. Useful for driving the learning
/// loop through known success sequences.
///
/// # Example
///
/// ```
/// use azr_sim::{ScriptedExecutor, SimulationExecutor};
/// use azr_types::{Difficulty, TaskParameters};
///
/// let mut exec = ScriptedExecutor::from_successes(&[true, false]);
/// let task = TaskParameters::new("t", "d", "reaching", Difficulty::Easy);
/// let a = exec.execute(&task, "").map(|r| r.success);
/// let b = exec.execute(&task, "").map(|r| r.success);
/// let c = exec.execute(&task, "").map(|r| r.success);
/// assert_eq!((a, b, c), (Ok(true), Ok(false), Ok(true)));
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    pattern: Vec<ScriptedOutcome>,
    metrics: ExecutionMetrics,
    calls: usize,
    initialized: bool,
    closed: bool,
    executed: Vec<(String, String)>,
}

impl ScriptedExecutor {
    /// Creates an executor replaying `pattern`.
    ///
    /// Default metrics are perfect: 1 s, full path and energy efficiency.
    #[must_use]
    pub fn new(pattern: Vec<ScriptedOutcome>) -> Self {
        Self {
            pattern,
            metrics: ExecutionMetrics::new(1.0, 1.0, 1.0).with_steps(100),
            calls: 0,
            initialized: false,
            closed: false,
            executed: Vec::new(),
        }
    }

    /// Replays success flags.
    #[must_use]
    pub fn from_successes(successes: &[bool]) -> Self {
        Self::new(
            successes
                .iter()
                .map(|&s| if s { ScriptedOutcome::Success } else { ScriptedOutcome::Failure })
                .collect(),
        )
    }

    /// Succeeds on every call.
    #[must_use]
    pub fn always_succeed() -> Self {
        Self::new(vec![ScriptedOutcome::Success])
    }

    /// Fails on every call.
    #[must_use]
    pub fn always_fail() -> Self {
        Self::new(vec![ScriptedOutcome::Failure])
    }

    /// Replaces the reported metrics.
    #[must_use]
    pub const fn with_metrics(mut self, metrics: ExecutionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Number of `execute` calls so far.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Returns true after `initialize`.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns true after `close`.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// `(task_id, code)` of every execution, in order.
    #[must_use]
    pub fn executed(&self) -> &[(String, String)] {
        &self.executed
    }
}

impl SimulationExecutor for ScriptedExecutor {
    fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn execute(&mut self, task: &TaskParameters, code: &str) -> Result<ExecutionResult> {
        let outcome = if self.pattern.is_empty() {
            ScriptedOutcome::Failure
        } else {
            self.pattern[self.calls % self.pattern.len()].clone()
        };
        self.calls += 1;
        self.executed.push((task.task_id.clone(), code.to_string()));
        debug!(task_id = %task.task_id, call = self.calls, ?outcome, "scripted execution");

        match outcome {
            ScriptedOutcome::Success => Ok(ExecutionResult::succeeded(self.metrics)),
            ScriptedOutcome::Failure => {
                Ok(ExecutionResult::unsuccessful(self.metrics).with_failure_reason("scripted failure"))
            }
            ScriptedOutcome::Error(e) => Err(e),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
