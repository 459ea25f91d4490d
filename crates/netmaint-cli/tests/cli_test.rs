//! Integration tests for the `netmaint` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling, all without a gateway or keyring populated.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `netmaint` binary with env isolation.
///
/// Clears all `NETMAINT_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn netmaint_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netmaint");
    cmd.env("HOME", "/tmp/netmaint-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netmaint-test-nonexistent")
        .env_remove("NETMAINT_OUTPUT")
        .env_remove("NETMAINT_PORT")
        .env_remove("NETMAINT_INSECURE")
        .env_remove("NETMAINT_DEFAULTS_PORT")
        .env_remove("NETMAINT_DEFAULTS_INSECURE")
        .env_remove("NETMAINT_SHEETS_URL");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netmaint_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    netmaint_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("maintenance")
            .and(predicate::str::contains("plan"))
            .and(predicate::str::contains("device"))
            .and(predicate::str::contains("circuits"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    netmaint_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netmaint"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    netmaint_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    netmaint_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = netmaint_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let output = netmaint_cmd()
        .args(["--output", "invalid", "device", "core1", "-t", "junos"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_plan_requires_device_type() {
    netmaint_cmd()
        .args(["plan", "core1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--device-type"));
}

#[test]
fn test_device_requires_host() {
    netmaint_cmd()
        .arg("device")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HOST"));
}

#[test]
fn test_circuits_requires_file() {
    netmaint_cmd()
        .arg("circuits")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--file"));
}

#[test]
fn test_missing_run_file_errors() {
    netmaint_cmd()
        .args(["circuits", "--file", "/nonexistent/run.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file"));
}

#[test]
fn test_circuits_rejects_unknown_device_family() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"hostname": "core1", "device_type": "nxos"}}"#).unwrap();

    let output = netmaint_cmd()
        .args(["circuits", "--file"])
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("unknown variant"),
        "Expected serde rejection of the device family:\n{text}"
    );
}

#[test]
fn test_plan_without_secrets_fails_before_connecting() {
    // No keyring entries exist in the test environment, so the vault
    // aborts during credential load, naming the first missing account.
    netmaint_cmd()
        .args(["plan", "core1.invalid", "-t", "iosxr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("primary-user"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_prints_toml_path() {
    netmaint_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netmaint").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_show_without_file_renders_defaults() {
    netmaint_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3443"));
}

#[test]
fn test_config_subcommands_exist() {
    netmaint_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("set-secret"))
                .and(predicate::str::contains("check")),
        );
}

// ── Global flags ────────────────────────────────────────────────────

#[test]
fn test_global_flags_parse() {
    // All flags should parse; the failure must come from the missing run
    // file, not from argument parsing.
    netmaint_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--insecure",
            "--plain-http",
            "--port",
            "3443",
            "circuits",
            "--file",
            "/nonexistent/run.json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file"));
}
