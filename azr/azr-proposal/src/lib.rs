//! Task and controller proposal sources for the GROOTZERO learning loop.
//!
//! A [`ProposalSource`] stands in for the foundation model: it proposes
//! tasks, generates controller code, evaluates executions and learns from
//! rewards. [`MockProposalSource`] serves fixed templates:
//!
//! | Template         | Type             | Difficulty |
//! |------------------|------------------|------------|
//! | cube to zone     | `pick_and_place` | easy       |
//! | three-block tower| `stacking`       | medium     |
//! | obstacle course  | `navigation`     | hard       |
//!
//! and three controller scripts (P, PD, waypoint state machine) whose
//! placeholders are filled from each task. Controller choice is delegated
//! to an [`azr_policy::SelectionPolicy`].
//!
//! # Example
//!
//! ```
//! use azr_policy::PolicyConfig;
//! use azr_proposal::{MockProposalSource, ProposalConfig, ProposalSource};
//! use azr_types::{Difficulty, LearningContext};
//!
//! let mut source = MockProposalSource::new(ProposalConfig::default().with_seed(1), PolicyConfig::default())
//!     .unwrap_or_else(|e| panic!("{e}"));
//! let task = source
//!     .propose_task(&LearningContext::fresh(Difficulty::Medium))
//!     .unwrap_or_else(|e| panic!("{e}"));
//! assert_eq!(task.task_type, "pick_and_place");
//!
//! let artifact = source.generate_controller_code(&task).unwrap_or_else(|e| panic!("{e}"));
//! assert!(artifact.code.contains(&task.task_id));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod config;
mod defaults;
mod mock;
mod source;

pub use config::{ApiType, ProposalConfig, TaskSelectionMode};
pub use defaults::{
    TARGET_POSITION_PLACEHOLDER, TASK_DESCRIPTION_PLACEHOLDER, TASK_ID_PLACEHOLDER,
    apply_task_to_controller, default_controllers, default_tasks,
};
pub use mock::{FeedbackRecord, MockProposalSource, range_factor, score_execution};
pub use source::{ControllerArtifact, ProposalSource};
