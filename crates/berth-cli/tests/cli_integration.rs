//! CLI subprocess integration tests.
//!
//! These tests invoke the `berth` binary as a subprocess and verify exit
//! codes, stdout content, and JSON output stability. Only commands that do not
//! reach docker or mutagen are exercised.

use std::path::Path;
use std::process::{Command, Output};

fn berth_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_berth"));
    cmd.env("BERTH_SKIP_PREREQS", "1");
    cmd.env_remove("BERTH_LOG");
    cmd
}

fn run_in(store: &Path, args: &[&str]) -> Output {
    let hosts = store.join("hosts");
    if !hosts.exists() {
        std::fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();
    }
    let config = store.join("config.toml");
    std::fs::write(
        &config,
        format!("hosts_file = \"{}\"\n", hosts.display()),
    )
    .unwrap();

    berth_bin()
        .arg("--store")
        .arg(store)
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .unwrap()
}

fn install_symfony(store: &Path, project: &Path, name: &str) -> Output {
    run_in(
        store,
        &[
            "--yes",
            "install",
            "--location",
            &project.to_string_lossy(),
            "--name",
            name,
            "--type",
            "symfony",
        ],
    )
}

#[test]
fn cli_version_exits_zero() {
    let output = berth_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "berth --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("berth"),
        "version output must contain 'berth': {stdout}"
    );
}

#[test]
fn cli_help_lists_lifecycle_commands() {
    let output = berth_bin().arg("--help").output().unwrap();
    assert!(output.status.success(), "berth --help must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["install", "start", "stop", "restart", "uninstall", "root"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_list_empty_store() {
    let store = tempfile::tempdir().unwrap();
    let output = run_in(store.path(), &["list"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no environments found"));
}

#[test]
fn cli_install_then_list_json() {
    let store = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let output = install_symfony(store.path(), project.path(), "blog");
    assert!(
        output.status.success(),
        "install must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(project.path().join("var/docker/docker-compose.yml").exists());

    let output = run_in(store.path(), &["--json", "list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("list --json must produce valid JSON: {e}\nstdout: {stdout}"));
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["name"], "blog");
    assert_eq!(arr[0]["type"], "symfony");
    assert_eq!(arr[0]["active"], false);
    assert!(arr[0]["domains"].is_null());
}

#[test]
fn cli_duplicate_install_is_invalid() {
    let store = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();

    assert!(install_symfony(store.path(), project.path(), "blog")
        .status
        .success());
    let output = install_symfony(store.path(), other.path(), "blog");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_invalid_name_is_exception() {
    let store = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let output = install_symfony(store.path(), project.path(), "my blog");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));

    let output = install_symfony(store.path(), project.path(), "My-Blog");
    assert_eq!(output.status.code(), Some(2));
    assert!(!project.path().join("var/docker").exists());
}

#[test]
fn cli_root_prints_exports() {
    let store = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    assert!(install_symfony(store.path(), project.path(), "blog")
        .status
        .success());

    let output = run_in(store.path(), &["root", "blog"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("export COMPOSE_PROJECT_NAME='blog'"));
    assert!(stdout.contains("export DOCKER_PHP_IMAGE='latest'"));
    assert!(stdout.contains("eval $(berth root)"));
}

#[test]
fn cli_unknown_environment_is_invalid() {
    let store = tempfile::tempdir().unwrap();
    for command in ["start", "stop", "uninstall"] {
        let output = run_in(store.path(), &["--yes", command, "ghost"]);
        assert_eq!(
            output.status.code(),
            Some(1),
            "{command} ghost must exit 1. stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

#[test]
fn cli_doctor_json_is_valid() {
    let store = tempfile::tempdir().unwrap();
    let output = run_in(store.path(), &["--json", "doctor"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("doctor --json must produce valid JSON: {e}\nstdout: {stdout}"));
    assert!(parsed["healthy"].is_boolean());
    assert!(parsed["checks"].is_array());
}

#[test]
fn cli_completions_bash() {
    let output = berth_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("berth"));
}
