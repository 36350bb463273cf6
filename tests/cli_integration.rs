use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// Binary with an empty per-user config directory.
fn envscope(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("envscope").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn shows_help() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect the environment"));
}

#[test]
fn shows_version() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn requires_subcommand() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn detect_subcommand_help() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["detect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-cache"));
}

#[test]
fn check_subcommand_help_lists_flags() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kubernetes"))
        .stdout(predicate::str::contains("serverless"));
}

#[test]
fn invalid_config_path_fails() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["--config", "/nonexistent/path.toml", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn invalid_config_value_fails() {
    let home = TempDir::new().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[cache]\nttl_ms = 0\n").unwrap();

    envscope(&home)
        .arg("--config")
        .arg(file.path())
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ttl_ms"));
}

#[test]
fn summary_starts_with_os_type() {
    let home = TempDir::new().unwrap();
    let expected = match std::env::consts::OS {
        "linux" | "macos" | "windows" => std::env::consts::OS,
        _ => "unknown",
    };

    envscope(&home)
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(expected));
}

#[test]
fn detect_outputs_report() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .arg("detect")
        .assert()
        .success()
        .stdout(predicate::str::contains("OS:"))
        .stdout(predicate::str::contains("Mode:"));
}

#[test]
fn detect_with_json_output() {
    let home = TempDir::new().unwrap();
    let output = envscope(&home)
        .args(["detect", "--json", "--no-cache"])
        .env("APP_ENV", "staging")
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for key in ["os", "container", "ci", "cloud", "privileges", "runtime", "mode"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["mode"]["mode"], "staging");
    assert_eq!(json["mode"]["source"], "staging");
}

#[test]
fn detect_async_matches_sync() {
    let home = TempDir::new().unwrap();
    let run = |extra: &[&str]| {
        let output = envscope(&home)
            .args(["detect", "--json"])
            .args(extra)
            .output()
            .unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        json["os"].clone()
    };

    assert_eq!(run(&[]), run(&["--async"]));
}

#[test]
fn check_true_exits_zero() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["check", "production"])
        .env("APP_ENV", "prod")
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn check_false_exits_one() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["check", "production"])
        .env("APP_ENV", "development")
        .assert()
        .code(1)
        .stdout("false\n");
}

#[test]
fn check_uses_configured_mode_variable() {
    let home = TempDir::new().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[mode]\nvariable = \"DEPLOY_STAGE\"\n").unwrap();

    envscope(&home)
        .arg("-c")
        .arg(file.path())
        .args(["check", "production"])
        .env("DEPLOY_STAGE", "production")
        .env("APP_ENV", "development")
        .assert()
        .success();
}

#[test]
fn completions_for_bash() {
    let home = TempDir::new().unwrap();
    envscope(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("envscope"));
}
