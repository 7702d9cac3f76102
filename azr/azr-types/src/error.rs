//! Error taxonomy shared by the learning-loop crates.

use thiserror::Error;

/// Errors that can occur anywhere in the learning loop.
///
/// Only [`AzrError::Configuration`] and [`AzrError::NoControllersAvailable`]
/// are fatal to a run; everything else is scoped to a single episode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AzrError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A proposed task is malformed.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Generated controller output is malformed.
    #[error("invalid controller: {0}")]
    InvalidController(String),

    /// Controller code failed to compile or crashed while running.
    #[error("controller execution failed: {0}")]
    ControllerExecution(String),

    /// The controller pool is empty.
    #[error("no controllers available: {0}")]
    NoControllersAvailable(String),

    /// A metric or difficulty value is missing or unusable.
    #[error("invalid metric: {0}")]
    InvalidMetric(String),

    /// Feedback referenced a controller index outside the pool.
    #[error("unknown controller index {index} (pool size {pool_size})")]
    UnknownController {
        /// The offending index.
        index: usize,
        /// Number of controllers known to the policy.
        pool_size: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl AzrError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Creates an invalid task error.
    #[must_use]
    pub fn invalid_task(reason: impl Into<String>) -> Self {
        Self::InvalidTask(reason.into())
    }

    /// Creates an invalid controller error.
    #[must_use]
    pub fn invalid_controller(reason: impl Into<String>) -> Self {
        Self::InvalidController(reason.into())
    }

    /// Creates a controller execution error.
    #[must_use]
    pub fn controller_execution(reason: impl Into<String>) -> Self {
        Self::ControllerExecution(reason.into())
    }

    /// Creates a no-controllers error.
    #[must_use]
    pub fn no_controllers(reason: impl Into<String>) -> Self {
        Self::NoControllersAvailable(reason.into())
    }

    /// Creates an invalid metric error.
    #[must_use]
    pub fn invalid_metric(reason: impl Into<String>) -> Self {
        Self::InvalidMetric(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }

    /// Returns true if the error must stop the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::NoControllersAvailable(_)
        )
    }
}

impl From<std::io::Error> for AzrError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for learning-loop operations.
pub type Result<T> = std::result::Result<T, AzrError>;
