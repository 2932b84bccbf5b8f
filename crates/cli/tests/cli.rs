use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn init_scenario(path: &Path) {
    Command::cargo_bin("contagio")
        .unwrap()
        .arg("init")
        .arg("--output")
        .arg(path)
        .assert()
        .success();
}

#[test]
fn test_init_writes_sample_scenario() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario written to"))
        .stdout(predicate::str::contains("Brussels"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"total_steps\": 120"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");
    init_scenario(&path);

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("init")
        .arg("--output")
        .arg(&path)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn test_validate_sample() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");
    init_scenario(&path);

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("validate")
        .arg("-c")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scenario is valid"))
        .stdout(predicate::str::contains("Schedule: 3 interventions"));
}

#[test]
fn test_validate_missing_file() {
    let temp = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("validate")
        .arg("-c")
        .arg(temp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_validate_rejects_unknown_neighbor() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{
            "execution": { "total_steps": 5, "seed": 1 },
            "families": [],
            "variants": [],
            "regions": [
                { "name": "Solo", "population": 100, "mobility": 1.0,
                  "neighbors": [{ "region": "Ghost", "travel_percentage": 2.0 }] }
            ]
        }"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("validate")
        .arg("-c")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown region: Ghost"));
}

#[test]
fn test_validate_rejects_malformed_json() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("garbage.json");
    std::fs::write(&path, "{ regions: ").unwrap();

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("validate")
        .arg("-c")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration"));
}

#[test]
fn test_run_prints_summary() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");
    init_scenario(&path);

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("run")
        .arg("-c")
        .arg(&path)
        .arg("--steps")
        .arg("10")
        .assert()
        .success()
        .stdout(predicate::str::contains("Steps: 10"))
        .stdout(predicate::str::contains("Results after 10 steps"))
        .stdout(predicate::str::contains("Simulation complete!"));
}

#[test]
fn test_run_writes_history() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");
    let history = temp.path().join("history.json");
    init_scenario(&path);

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("run")
        .arg("-c")
        .arg(&path)
        .arg("--steps")
        .arg("5")
        .arg("--seed")
        .arg("7")
        .arg("--stochastic")
        .arg("--output")
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("History written to"));

    let text = std::fs::read_to_string(&history).unwrap();
    assert!(text.contains("\"steps\": 5"));
    assert!(text.contains("\"region\": \"Brussels\""));
    assert!(text.contains("\"variant\": \"sars-cov\""));
}

#[test]
fn test_run_parallel_with_threads() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("scenario.json");
    init_scenario(&path);

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("--threads")
        .arg("2")
        .arg("run")
        .arg("-c")
        .arg(&path)
        .arg("--steps")
        .arg("3")
        .arg("--parallel")
        .assert()
        .success()
        .stdout(predicate::str::contains("Region Stepping: Parallel"));
}

#[test]
fn test_run_missing_config() {
    let temp = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("contagio").unwrap();
    cmd.arg("run")
        .arg("-c")
        .arg(temp.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
