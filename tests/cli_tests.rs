//! Integration tests for the settings-resolver binary.
//!
//! Runs the built binary against settings directories on disk and checks
//! what lands on stdout and stderr.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write settings file");
}

/// Run the binary over `dir` with logging off.
fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_settings-resolver"))
        .arg("--dir")
        .arg(dir)
        .args(["--log", "off"])
        .args(args)
        .env_remove("SETTINGS_RESOLVER_UNSET_DB_PORT")
        .output()
        .expect("Failed to run settings-resolver")
}

/// Settings directory whose env file references an undefined variable.
fn dir_with_unresolved_placeholder() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "default-settings.ini",
        "[sql]\nserver = localhost\nport = 3306\n",
    );
    write(dir.path(), "settings.ini", "[sql]\nserver = db\n");
    write(
        dir.path(),
        "settings.env.ini",
        "[sql]\nport = {{SETTINGS_RESOLVER_UNSET_DB_PORT}}\n",
    );
    dir
}

#[test]
fn show_stdout_is_json_with_unresolved_placeholder() {
    let dir = dir_with_unresolved_placeholder();
    let output = run(dir.path(), &["show"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is not JSON");
    assert_eq!(json["sql"]["server"], "db");
    assert_eq!(json["sql"]["port"], "3306");

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("SETTINGS_RESOLVER_UNSET_DB_PORT"));
}

#[test]
fn check_reports_diagnostics_on_stdout() {
    let dir = dir_with_unresolved_placeholder();
    let output = run(dir.path(), &["check"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("source: ini"));
    assert!(stdout.contains("diagnostics: 1"));
    assert!(stdout.contains("SETTINGS_RESOLVER_UNSET_DB_PORT"));
}

#[test]
fn missing_settings_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["show"]);
    assert!(!output.status.success());
}
