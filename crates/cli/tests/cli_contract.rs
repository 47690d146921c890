use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name)
}

fn replay_json(script: &str, config: &str) -> Value {
    let output = cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture(script))
        .arg("--config")
        .arg(fixture(config))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

#[test]
fn replay_emits_line_items_for_full_session() {
    let report = replay_json("takeoff-session.json", "default-config.json");

    let items = report["lineItems"].as_array().expect("lineItems array");
    assert_eq!(items.len(), 4);

    assert_eq!(items[0]["quantity"], 5.0);
    assert_eq!(items[0]["unit"], "ft");
    assert_eq!(items[0]["description"], "Linear Measurement (page 1)");

    assert_eq!(items[1]["quantity"], 100.0);
    assert_eq!(items[1]["unit"], "sq ft");

    assert_eq!(items[2]["unit"], "ea");
    assert_eq!(items[2]["page"], 1);
    assert_eq!(items[3]["page"], 2);

    assert_eq!(report["calibration"]["pixelsPerUnit"], 10.0);
    assert_eq!(report["page"], 2);
    assert_eq!(report["pageCount"], 2);
    assert_eq!(report["annotations"], 4);
}

#[test]
fn replay_prices_items_with_configured_unit_costs() {
    let report = replay_json("takeoff-session.json", "unit-costs.json");

    assert_eq!(report["lineItems"][0]["totalCost"], 12.5);
    assert_eq!(report["lineItems"][1]["totalCost"], 400.0);
    assert_eq!(report["totalCost"], 512.5);
}

#[test]
fn replay_ignores_stale_render() {
    let report = replay_json("stale-render.json", "default-config.json");

    assert_eq!(report["page"], 3);
    assert_eq!(report["viewport"]["zoom"], 0.5);
    assert_eq!(report["events"][3]["outcome"], "stale");
}

#[test]
fn replay_continues_after_rejected_calibration() {
    let report = replay_json("rejected-calibration.json", "default-config.json");

    let outcome = report["events"][3]["outcome"].as_str().expect("outcome string");
    assert!(outcome.starts_with("rejected:"), "unexpected outcome {outcome}");
    assert_eq!(report["calibration"]["pixelsPerUnit"], 0.0);
    assert_eq!(report["lineItems"][0]["quantity"], 50.0);
    assert_eq!(report["lineItems"][0]["unit"], "px");
}

#[test]
fn strict_replay_fails_on_rejected_calibration() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("rejected-calibration.json"))
        .arg("--config")
        .arg(fixture("default-config.json"))
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("known distance must be greater than zero"));
}

#[test]
fn replay_writes_csv() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("takeoff-session.json"))
        .arg("--config")
        .arg(fixture("default-config.json"))
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ID,Page,Description,Category,Quantity,Unit,Unit Cost,Total Cost,Notes",
        ))
        .stdout(predicate::str::contains("Area Measurement (page 1),Manual Takeoff,100,sq ft"));
}

#[test]
fn replay_fails_for_missing_script() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read script"));
}

#[test]
fn replay_fails_for_malformed_script() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("truncated-script.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse script"));
}

#[test]
fn replay_rejects_invalid_config() {
    cargo_bin_cmd!("takeoff")
        .arg("replay")
        .arg(fixture("takeoff-session.json"))
        .arg("--config")
        .arg(fixture("invalid-zoom-config.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid canvas configuration"));
}

#[test]
fn config_init_then_show() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("takeoff")
        .args(["config", "init", "--dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("canvas-config.json"));

    cargo_bin_cmd!("takeoff")
        .args(["config", "init", "--dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("config already exists"));

    cargo_bin_cmd!("takeoff")
        .args(["config", "show", "--config"])
        .arg(temp.path().join("canvas-config.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_unit\": \"ft\""));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("takeoff")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
