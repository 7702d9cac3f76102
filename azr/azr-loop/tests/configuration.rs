//! Configuration file handling.
//!
//! Run with: cargo test -p azr-loop --test configuration

use azr_loop::{GrootzeroConfig, REQUIRED_KEYS};
use azr_policy::SelectionMode;
use azr_proposal::TaskSelectionMode;
use azr_reward::{MetricPolicy, RewardType};
use azr_types::{AzrError, Difficulty};

const SHIPPED: &str = include_str!("../../../config/grootzero.toml");

#[test]
fn shipped_config_matches_defaults() {
    let config = GrootzeroConfig::from_toml_str(SHIPPED).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(config, GrootzeroConfig::default());
}

#[test]
fn save_then_load_preserves_overrides() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("runs").join("grootzero.toml");

    let mut config = GrootzeroConfig::default().with_seed(21);
    config.learning.reward_type = RewardType::Binary;
    config.learning.metric_policy = MetricPolicy::DefaultToZero;
    config.learning.initial_difficulty = Difficulty::Easy;
    config.groot_n1.task_selection = TaskSelectionMode::Difficulty;
    config.groot_n1.controller_selection = SelectionMode::MatchTask;
    config.azr.max_episodes = 12;

    config.save(&path).unwrap_or_else(|e| panic!("{e}"));
    let loaded = GrootzeroConfig::load(&path).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(loaded, config);
}

#[test]
fn every_required_key_is_reported() {
    let err = GrootzeroConfig::from_toml_str("").err();
    let Some(AzrError::Configuration(msg)) = err else {
        panic!("expected configuration error, got {err:?}");
    };
    for (section, key) in REQUIRED_KEYS {
        assert!(msg.contains(&format!("{section}.{key}")), "{msg}");
    }
}

#[test]
fn missing_file_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(
        GrootzeroConfig::load(dir.path().join("absent.toml")),
        Err(AzrError::Configuration(_))
    ));
}

#[test]
fn disabled_mock_backend_is_rejected() {
    let text = SHIPPED.replace("mock_enabled = true", "mock_enabled = false");
    assert!(matches!(
        GrootzeroConfig::from_toml_str(&text),
        Err(AzrError::Configuration(_))
    ));
}

#[test]
fn legacy_selection_spelling_maps_to_random() {
    let text = SHIPPED.replace(
        "controller_selection = \"sequential\"",
        "controller_selection = \"performance_weighted\"",
    );
    let config = GrootzeroConfig::from_toml_str(&text).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(config.groot_n1.controller_selection, SelectionMode::Random);
}

#[test]
fn config_serializes_to_json() {
    let config = GrootzeroConfig::default();
    let json = serde_json::to_value(&config).unwrap_or_default();
    assert_eq!(json["learning"]["reward_type"], "shaped");
    assert_eq!(json["groot_n1"]["api_type"], "mock");
    assert_eq!(json["azr"]["max_episodes"], 100);
}
