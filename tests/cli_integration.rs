//! CLI integration tests.
//!
//! These tests verify the CLI argument parsing, configuration loading and
//! the `shell-queue` binary itself.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command as Process;
use std::time::Duration;
use tempfile::NamedTempFile;

use shell_queue::cli::{parse_args_from, Args};
use shell_queue::config::Config;

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("shell-queue")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn binary() -> Process {
    let mut process = Process::new(env!("CARGO_BIN_EXE_shell-queue"));
    for var in [
        "SHELL_QUEUE_SHELL",
        "SHELL_QUEUE_ESCALATION",
        "SHELL_QUEUE_TIMEOUT",
        "SHELL_QUEUE_LOG_LEVEL",
        "RUST_LOG",
    ] {
        process.env_remove(var);
    }
    process.arg("-l").arg("error");
    process
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(!result.root);
    assert!(result.shell.is_none());
    assert!(result.timeout.is_none());
    assert!(result.config.is_none());
    assert!(result.log_level.is_none());
    assert!(result.commands.is_empty());
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-r",
        "-s",
        "/bin/bash",
        "-t",
        "30",
        "-l",
        "debug",
        "id",
        "whoami",
    ]))
    .unwrap();

    assert!(result.root);
    assert_eq!(result.shell, Some("/bin/bash".to_string()));
    assert_eq!(result.timeout, Some(30));
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert_eq!(result.commands, vec!["id", "whoami"]);
}

#[test]
fn test_cli_config_file() {
    let result = parse_args_from(args(&["-c", "/etc/shell-queue.json"])).unwrap();
    assert_eq!(result.config, Some(PathBuf::from("/etc/shell-queue.json")));
}

#[test]
fn test_cli_invalid_timeout() {
    assert!(parse_args_from(args(&["-t", "abc"])).is_err());
}

#[test]
fn test_cli_missing_value() {
    assert!(parse_args_from(args(&["--shell"])).is_err());
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let json = r#"{
        "shell": {
            "program": "/bin/sh",
            "escalation": ["sudo", "-n", "sh"],
            "startup_timeout_ms": 2500
        },
        "execution": {
            "default_timeout_secs": 60
        },
        "logging": {
            "level": "debug"
        }
    }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.shell.escalation, vec!["sudo", "-n", "sh"]);
    assert_eq!(config.shell.startup_timeout_ms, 2500);
    assert_eq!(config.execution.default_timeout_secs, Some(60));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_config_priority_cli_over_file() {
    let json = r#"{
        "shell": { "program": "/bin/bash" },
        "execution": { "default_timeout_secs": 60 },
        "logging": { "level": "warn" }
    }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let cli = Args {
        config: Some(file.path().to_path_buf()),
        shell: Some("/bin/dash".to_string()),
        timeout: Some(5),
        log_level: Some("trace".to_string()),
        ..Args::default()
    };

    let config = Config::load(&cli).unwrap();
    assert_eq!(config.shell.program, "/bin/dash");
    assert_eq!(config.execution.default_timeout_secs, Some(5));
    assert_eq!(config.log_filter(), "trace");
}

#[test]
fn test_config_load_missing_file() {
    let cli = Args {
        config: Some(PathBuf::from("/nonexistent/shell-queue.json")),
        ..Args::default()
    };
    assert!(Config::load(&cli).is_err());
}

#[test]
fn test_config_to_session_config() {
    let json = r#"{
        "shell": {
            "working_dir": "/tmp",
            "env": { "MODE": "test" },
            "escalation": ["sudo", "-n", "sh"]
        },
        "execution": { "default_timeout_secs": 7 }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();
    let session = config.to_session_config(true).unwrap();

    assert!(session.elevated);
    assert_eq!(session.working_dir, Some(PathBuf::from("/tmp")));
    assert_eq!(session.env.get("MODE").map(String::as_str), Some("test"));
    assert_eq!(session.default_timeout, Some(Duration::from_secs(7)));
    assert_eq!(
        session.launch_command(),
        (
            "sudo".to_string(),
            vec!["-n".to_string(), "sh".to_string()]
        )
    );
}

#[test]
fn test_config_roundtrip() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.shell.program, config.shell.program);
    assert_eq!(parsed.shell.escalation, config.shell.escalation);
    assert_eq!(parsed.logging.level, config.logging.level);
}

#[test]
fn test_config_partial_deserialization() {
    let json = r#"{ "execution": { "default_timeout_secs": 1 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.shell.program, "/bin/sh");
    assert_eq!(config.execution.default_timeout_secs, Some(1));
}

// ============================================================================
// Binary Tests
// ============================================================================

#[test]
fn test_binary_version() {
    let output = binary().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("shell-queue "));
}

#[test]
fn test_binary_bad_flag() {
    let output = binary().arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_binary_runs_commands_in_one_shell() {
    let output = binary()
        .args(["cd /", "pwd", "echo done"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["/", "done"]);
}

#[cfg(unix)]
#[test]
fn test_binary_exits_with_last_status() {
    let output = binary().args(["true", "sh -c 'exit 3'"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn test_binary_missing_shell() {
    let output = binary()
        .args(["-s", "/nonexistent/shell", "true"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(125));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}
