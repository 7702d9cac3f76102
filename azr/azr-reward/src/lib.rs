//! Reward shaping for the GROOTZERO learning loop.
//!
//! Maps an [`ExecutionResult`](azr_types::ExecutionResult) and the task
//! [`Difficulty`](azr_types::Difficulty) to a scalar reward:
//!
//! | Term    | Value                                  |
//! |---------|----------------------------------------|
//! | base    | +1.0 on success, -1.0 on failure       |
//! | time    | up to +0.5 (success only)              |
//! | path    | up to +0.3 (success only)              |
//! | energy  | up to +0.2 (success only)              |
//!
//! The sum is scaled by the difficulty multiplier (easy 0.8, medium 1.0,
//! hard 1.2). [`calculate_normalized_reward`] squashes the result into
//! [-1, 1] for consumers that need a bounded signal.
//!
//! # Example
//!
//! ```
//! use azr_reward::calculate_reward;
//! use azr_types::{Difficulty, ExecutionResult};
//!
//! let reward = calculate_reward(&ExecutionResult::failed("timeout"), Difficulty::Easy);
//! assert!(matches!(reward, Ok(r) if (r + 0.8).abs() < 1e-12));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod calculator;

pub use calculator::{
    ENERGY_BONUS_MAX, FAILURE_REWARD, MetricPolicy, PATH_BONUS_MAX, RewardBreakdown,
    RewardCalculator, RewardType, SUCCESS_REWARD, TIME_BONUS_MAX, TIME_FLOOR_SECS,
    TIME_REFERENCE_SECS, calculate_normalized_reward, calculate_reward, normalize_reward,
    time_efficiency,
};
