//! GROOTZERO command-line runner.
//!
//! Runs the self-play learning loop against the mock proposal source and
//! the kinematic simulator, then prints what the selection policy learned.
//!
//! # Usage
//!
//! - `grootzero` - 100 episodes with the default configuration
//! - `grootzero --config grootzero.toml --num-episodes 20` - Custom run
//! - `grootzero --dump-config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use azr_loop::{EpisodeOutcome, GrootzeroConfig, MockLearningLoop, build_mock_loop, logging};
use azr_policy::SelectionMode;
use azr_proposal::TaskSelectionMode;
use clap::Parser;
use tracing::info;

/// GROOTZERO learning loop
///
/// Proposes tasks, generates controllers, runs them in simulation and
/// reinforces the controllers that work.
#[derive(Parser)]
#[command(name = "grootzero")]
#[command(about = "Self-play controller learning loop", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warning, error, critical)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Episodes to run (defaults to azr.max_episodes)
    #[arg(long)]
    num_episodes: Option<usize>,

    /// Task selection mode (sequential, random, difficulty)
    #[arg(long)]
    task_selection: Option<String>,

    /// Controller selection mode (sequential, random, match_task)
    #[arg(long)]
    controller_selection: Option<String>,

    /// Selection-weight learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    if cli.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    logging::init(&cli.log_level, cli.json_logs, cli.log_file.as_deref())?;
    info!(
        task_selection = %config.groot_n1.task_selection,
        controller_selection = %config.groot_n1.controller_selection,
        learning_rate = config.learning.learning_rate,
        "starting GROOTZERO"
    );

    let mut lp = build_mock_loop(&config).context("failed to build learning loop")?;
    let result = lp.run(cli.num_episodes);
    lp.close().context("failed to close simulator")?;
    let summary = result.context("learning loop failed")?;

    println!("Episodes:");
    for outcome in &summary.completed {
        print_episode(outcome);
    }
    for aborted in &summary.aborted {
        println!(
            "  #{:<4} aborted  task={} controller={} error={}",
            aborted.episode,
            aborted.task_id.as_deref().unwrap_or("-"),
            aborted.controller_index.map_or_else(|| "-".to_string(), |i| i.to_string()),
            aborted.error
        );
    }

    println!();
    println!("Stop reason:       {:?}", summary.stop_reason);
    println!("Final difficulty:  {}", summary.final_difficulty);
    if let Some(rate) = summary.success_rate() {
        println!("Success rate:      {:.1}%", rate * 100.0);
    }
    print_policy(&lp);
    Ok(())
}

fn effective_config(cli: &Cli) -> Result<GrootzeroConfig> {
    let mut config = match &cli.config {
        Some(path) => GrootzeroConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => GrootzeroConfig::default(),
    };

    if let Some(mode) = &cli.task_selection {
        config.groot_n1.task_selection = mode.parse::<TaskSelectionMode>()?;
    }
    if let Some(mode) = &cli.controller_selection {
        config.groot_n1.controller_selection = mode.parse::<SelectionMode>()?;
    }
    if let Some(rate) = cli.learning_rate {
        config.learning.learning_rate = rate;
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn print_episode(outcome: &EpisodeOutcome) {
    let status = if outcome.result.success { "success" } else { "failure" };
    let change = outcome
        .difficulty_change
        .map_or_else(String::new, |d| format!(" -> {d}"));
    println!(
        "  #{:<4} {:<8} {:<15} controller={} score={:.2} reward={:+.3} [{}{}]",
        outcome.episode,
        status,
        outcome.task.task_type,
        outcome.controller_index,
        outcome.evaluation.score,
        outcome.reward,
        outcome.difficulty,
        change
    );
}

fn print_policy(lp: &MockLearningLoop) {
    let policy = lp.proposal().policy();

    println!();
    println!("Controller weights:");
    for (index, (weight, p)) in policy
        .weights()
        .iter()
        .zip(policy.probabilities())
        .enumerate()
    {
        println!("  [{index}] weight={weight:.3} p={p:.3}");
    }

    println!();
    println!("Successful controllers by task type:");
    if policy.task_type_map().is_empty() {
        println!("  (none)");
    }
    for (task_type, controllers) in policy.task_type_map() {
        println!("  {task_type}: {controllers:?}");
    }
}
