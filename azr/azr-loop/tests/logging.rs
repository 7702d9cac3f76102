//! Log file output. Kept in its own binary because it installs the global
//! subscriber.
//!
//! Run with: cargo test -p azr-loop --test logging

use std::fs;

use azr_loop::logging;
use azr_types::AzrError;

#[test]
fn events_reach_the_log_file() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let path = dir.path().join("logs").join("grootzero.log");

    logging::init("info", false, Some(&path)).unwrap_or_else(|e| panic!("{e}"));
    tracing::info!(episode = 3, "episode finished");

    let text = fs::read_to_string(&path).unwrap_or_default();
    assert!(text.contains("episode finished"));
    assert!(text.contains("episode=3"));

    // A second subscriber cannot be installed.
    assert!(matches!(
        logging::init("info", true, None),
        Err(AzrError::Configuration(_))
    ));
}
