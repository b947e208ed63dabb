use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `blueprint` invocation isolated to a scratch config and database
fn blueprint(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("blueprint").unwrap();
    cmd.env("BLUEPRINT_CONFIG", dir.path().join("config.toml"))
        .env("BLUEPRINT_DB_PATH", dir.path().join("db"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("blueprint").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Offline training log"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("workout"));
}

#[test]
fn test_version_command() {
    let mut cmd = Command::cargo_bin("blueprint").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_completions_command() {
    let mut cmd = Command::cargo_bin("blueprint").unwrap();
    cmd.arg("completions").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_blueprint"));
}

#[test]
fn test_commands_need_an_active_profile() {
    let dir = TempDir::new().unwrap();

    blueprint(&dir)
        .args(["weight", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active profile"));
}

#[test]
fn test_profile_and_weight_flow() {
    let dir = TempDir::new().unwrap();

    blueprint(&dir)
        .args(["profile", "create", "Alex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created profile"));

    blueprint(&dir)
        .args(["weight", "add", "80.5", "--date", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80.5 kg"));

    blueprint(&dir)
        .args(["weight", "add", "80.0", "--date", "2024-03-08"])
        .assert()
        .success();

    blueprint(&dir)
        .args(["weight", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-01"))
        .stdout(predicate::str::contains("2024-03-08"))
        .stdout(predicate::str::contains("Weight (2 records)"));

    blueprint(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alex"));
}

#[test]
fn test_plan_and_quick_log_flow() {
    let dir = TempDir::new().unwrap();

    blueprint(&dir).args(["profile", "create", "Sam"]).assert().success();
    blueprint(&dir)
        .args(["exercise", "add", "Back Squat", "--muscles", "quads,glutes"])
        .assert()
        .success();
    blueprint(&dir)
        .args(["plan", "create", "Strength"])
        .assert()
        .success();
    blueprint(&dir)
        .args(["plan", "add-session", "Strength", "Day A", "--day", "mon"])
        .assert()
        .success();
    blueprint(&dir)
        .args(["plan", "add-exercise", "Strength", "Day A", "Back Squat", "5x5@100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 x 5 @ 100.0 kg"));

    blueprint(&dir)
        .args(["plan", "show", "Strength"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Day A"))
        .stdout(predicate::str::contains("Back Squat"));

    blueprint(&dir)
        .args(["workout", "log", "Back Squat=3x5@100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("volume 1500.0 kg"));

    blueprint(&dir)
        .args(["progress", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal records"))
        .stdout(predicate::str::contains("Back Squat"));
}

#[test]
fn test_export_then_validate() {
    let dir = TempDir::new().unwrap();
    let export = dir.path().join("export.json");

    blueprint(&dir).args(["profile", "create", "Kim"]).assert().success();
    blueprint(&dir)
        .args(["height", "add", "180"])
        .assert()
        .success();
    blueprint(&dir)
        .args(["data", "export", "--output"])
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    blueprint(&dir)
        .args(["data", "validate"])
        .arg(&export)
        .assert()
        .success();
}

#[test]
fn test_rejects_bad_set_shorthand() {
    let dir = TempDir::new().unwrap();

    blueprint(&dir).args(["profile", "create", "Lee"]).assert().success();
    blueprint(&dir).args(["exercise", "add", "Bench"]).assert().success();
    blueprint(&dir)
        .args(["workout", "log", "Bench=lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not read"));
}
