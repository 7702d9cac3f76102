//! Reward-driven controller selection for the GROOTZERO learning loop.
//!
//! [`SelectionPolicy`] keeps one weight per controller in the pool and
//! draws a controller for each episode under a [`SelectionMode`]:
//!
//! - `sequential` - round-robin by call count
//! - `random` - proportional to the current weights
//! - `match_task` - biased toward controllers that already succeeded on
//!   the same task type, falling back to weights
//!
//! Rewards flow back through [`SelectionPolicy::update`], which nudges the
//! weight by `learning_rate · reward` and never lets it fall below
//! `min_weight`. Per-controller statistics are kept in
//! [`ControllerPerformance`].
//!
//! # Example
//!
//! ```
//! use azr_policy::{PolicyConfig, SelectionContext, SelectionMode, SelectionPolicy};
//!
//! let mut policy = SelectionPolicy::new(3, PolicyConfig::default().with_seed(9))
//!     .unwrap_or_else(|_| unreachable!());
//! let picked = policy
//!     .select(SelectionMode::Random, SelectionContext::new("stacking"))
//!     .unwrap_or_default();
//! assert!(picked < 3);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod mode;
mod performance;
mod policy;

pub use mode::SelectionMode;
pub use performance::{ControllerPerformance, OutcomeStats};
pub use policy::{MIN_WEIGHT_FLOOR, PolicyConfig, SelectionContext, SelectionPolicy};
