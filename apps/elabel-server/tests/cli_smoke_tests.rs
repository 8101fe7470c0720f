//! CLI smoke tests for the elabel-server binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn run_elabel_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_elabel-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute elabel-server")
}

/// Writes a config whose home dir (logs, relative SQLite paths) lives in the temp dir.
fn write_config(dir: &TempDir, extra: &str) -> PathBuf {
    let home = dir.path().to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 5000

database:
  url: "sqlite://data/elabel.db"

logging:
  default:
    console_level: info
    file: "logs/elabel.log"
    file_level: info
{extra}
"#
    );
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).expect("Failed to write config file");
    path
}

const AUTH_SECRETS: &str = r#"
modules:
  auth:
    jwt_secret: "smoke-jwt-secret"
    session_secret: "smoke-session-secret"
"#;

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path is valid UTF-8")
}

#[test]
fn test_cli_help_command() {
    let output = run_elabel_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("seed-templates"));
    assert!(stdout.contains("--config"));
}

#[test]
fn test_cli_version_command() {
    let output = run_elabel_server(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("elabel-server"));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_elabel_server(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "unexpected stderr: {stderr}");
}

#[test]
fn test_cli_config_missing_file() {
    for flag in ["--config", "-c"] {
        let output = run_elabel_server(&[flag, "/nonexistent/config.yaml", "check"]);
        assert!(!output.status.success(), "Should fail with missing config");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("Config file not found"),
            "Should mention the missing file: {stderr}"
        );
    }
}

#[test]
fn test_cli_config_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_elabel_server(&["--config", path_arg(&config_path), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config") || stderr.contains("yaml"),
        "Should mention the config problem: {stderr}"
    );
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);

    let output = run_elabel_server(&["--config", path_arg(&config_path), "check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains("Configuration check passed"));
}

#[test]
fn test_cli_check_requires_auth_secrets() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "");

    let output = run_elabel_server(&["--config", path_arg(&config_path), "check"]);
    assert!(!output.status.success(), "Missing JWT secret must fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("jwt_secret"), "unexpected stderr: {stderr}");
}

#[test]
fn test_cli_check_rejects_unknown_database_scheme() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);
    let raw = std::fs::read_to_string(&config_path).unwrap();
    std::fs::write(
        &config_path,
        raw.replace("sqlite://data/elabel.db", "mysql://localhost/elabel"),
    )
    .unwrap();

    let output = run_elabel_server(&["--config", path_arg(&config_path), "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown DSN"), "unexpected stderr: {stderr}");
}

#[test]
fn test_cli_mock_flag_overrides_database() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);

    let output = run_elabel_server(&["--config", path_arg(&config_path), "--mock", "--print-config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sqlite::memory:"), "unexpected config: {stdout}");
}

#[test]
fn test_cli_port_override_in_printed_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);

    let output = run_elabel_server(&["-c", path_arg(&config_path), "-p", "6123", "--print-config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 6123"), "unexpected config: {stdout}");
}

#[tokio::test]
async fn test_cli_run_starts_and_keeps_serving() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let extra = format!("{AUTH_SECRETS}  api_ingress:\n    bind_addr: \"127.0.0.1:0\"\n");
    let config_path = write_config(&temp_dir, &extra);

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_elabel-server"))
        .args(["--config", path_arg(&config_path), "--mock", "run"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn elabel-server");

    // Still running after the grace period means startup succeeded.
    let waited = timeout(Duration::from_secs(5), child.wait()).await;
    assert!(waited.is_err(), "server exited early: {waited:?}");

    child.kill().await.expect("Failed to stop server");
}

#[test]
fn test_cli_seed_templates_is_idempotent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);
    let seed_path = temp_dir.path().join("templates.yaml");
    std::fs::write(
        &seed_path,
        r#"
templates:
  - templateName: Kit Label
    version: 1
    requiredFields:
      - { name: protocolNumber, type: String, label: Protocol, required: true }
  - templateName: Carton Label
    version: 1
"#,
    )
    .unwrap();

    let args = [
        "--config",
        path_arg(&config_path),
        "seed-templates",
        path_arg(&seed_path),
    ];

    let first = run_elabel_server(&args);
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(
        first.status.success(),
        "STDERR: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    assert!(stdout.contains("Imported 2 of 2 templates"), "{stdout}");
    assert!(temp_dir.path().join("data/elabel.db").exists());

    let second = run_elabel_server(&args);
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(second.status.success());
    assert!(stdout.contains("Imported 0 of 2 templates"), "{stdout}");
}

#[test]
fn test_cli_seed_templates_rejects_bad_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, AUTH_SECRETS);
    let seed_path = temp_dir.path().join("templates.yaml");
    std::fs::write(&seed_path, "templates:\n  - version: 1\n").unwrap();

    let output = run_elabel_server(&[
        "--config",
        path_arg(&config_path),
        "seed-templates",
        path_arg(&seed_path),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load"), "unexpected stderr: {stderr}");
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_elabel_server(&["seed-templates", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<FILE>"), "unexpected help: {stdout}");
}
