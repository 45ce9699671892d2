//! Integration tests for the stalebot CLI

use std::fs;

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "STALEBOT_CONFIG",
    "STALEBOT_OWNER",
    "STALEBOT_REPO",
    "STALEBOT_LABEL",
    "STALEBOT_FRESH_LABEL",
    "STALEBOT_STALE_AFTER",
    "STALEBOT_LOG_FILE",
    "STALEBOT_API_URL",
    "STALEBOT_CONCURRENCY",
    "GH_TOKEN",
    "GITHUB_TOKEN",
];

/// Get a Command for the stalebot binary, isolated from the caller's
/// environment and config files.
fn stalebot(dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("stalebot"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("HOME", dir.path());
    cmd
}

fn write_config(dir: &TempDir, content: &str) {
    fs::write(dir.path().join("stalebot.toml"), content).unwrap();
}

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();
    stalebot(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Close issues that went quiet"));
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    stalebot(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_config_show_reads_working_dir_file() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        "owner = \"octo\"\nrepo = \"widgets\"\ntracking-label = \"pending-update\"\nstale-after = \"5m\"\n",
    );

    stalebot(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("owner = \"octo\""))
        .stdout(predicate::str::contains("tracking-label = \"pending-update\""));
}

#[test]
fn test_config_show_applies_flag_overrides() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "owner = \"octo\"\nrepo = \"widgets\"\n");

    stalebot(&temp)
        .args(["--repo", "gadgets", "config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"repo\": \"gadgets\""));
}

#[test]
fn test_config_show_env_override() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .env("STALEBOT_OWNER", "from-env")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("owner = \"from-env\""));
}

#[test]
fn test_config_validate_valid() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        "owner = \"octo\"\nrepo = \"widgets\"\ntracking-label = \"pending-update\"\n",
    );

    stalebot(&temp)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));
}

#[test]
fn test_config_validate_defaults_fail() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .args(["config", "validate"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("owner"));
}

#[test]
fn test_config_validate_rejects_bad_threshold() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .args(["--stale-after", "soon", "config", "validate"])
        .assert()
        .failure();
}

#[test]
fn test_explicit_config_must_exist() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .args(["--config", "missing.toml", "config", "show"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_run_with_invalid_config_exits_before_network() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .args(["run", "--dry-run"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("owner"));
}

#[test]
fn test_run_without_token_is_config_error() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        "owner = \"octo\"\nrepo = \"widgets\"\ntracking-label = \"pending-update\"\n",
    );

    stalebot(&temp)
        .args(["run", "--dry-run"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("GH_TOKEN"));
}

#[test]
fn test_config_paths() {
    let temp = TempDir::new().unwrap();

    stalebot(&temp)
        .args(["config", "paths"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stalebot.toml"));
}
