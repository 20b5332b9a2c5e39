mod support;

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use support::TestTracker;

fn trk_cmd(tracker: &TestTracker) -> Command {
    let mut cmd = support::trk_cmd();
    cmd.current_dir(tracker.path());
    cmd
}

#[test]
fn init_creates_data_dir_and_config() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::empty()?;

    let output = trk_cmd(&tracker)
        .args(["init", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["command"].as_str(), Some("init"));
    assert_eq!(value["data"]["created"]["trk_dir"].as_bool(), Some(true));
    assert_eq!(value["data"]["created"]["config"].as_bool(), Some(true));

    assert!(tracker.trk_dir().is_dir());
    assert!(tracker.changes_dir().is_dir());

    let config = fs::read_to_string(tracker.path().join(".trk.toml"))?;
    assert!(config.contains("default_status = \"new\""));

    Ok(())
}

#[test]
fn init_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::empty()?;

    trk_cmd(&tracker).arg("init").assert().success();

    let output = trk_cmd(&tracker)
        .args(["init", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["data"]["created"]["trk_dir"].as_bool(), Some(false));
    assert_eq!(value["data"]["created"]["config"].as_bool(), Some(false));

    Ok(())
}

#[test]
fn init_keeps_an_existing_config() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::empty()?;
    tracker.write_trk_config("[tasks]\ndefault_priority = \"high\"\n")?;

    trk_cmd(&tracker).arg("init").assert().success();

    let config = fs::read_to_string(tracker.path().join(".trk.toml"))?;
    assert!(config.contains("default_priority = \"high\""));

    Ok(())
}

#[test]
fn commands_fail_without_a_tracker() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::empty()?;

    trk_cmd(&tracker)
        .args(["company", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("trk init"));

    Ok(())
}

#[test]
fn tracker_is_discovered_from_a_subdirectory() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::init()?;
    let nested = tracker.path().join("src/deep");
    fs::create_dir_all(&nested)?;

    let mut cmd = support::trk_cmd();
    cmd.current_dir(&nested)
        .args(["company", "new", "Acme"])
        .assert()
        .success();

    assert!(tracker.trk_dir().join("companies.json").exists());

    Ok(())
}
