//! CLI tests for `devteam exec` and `devteam init`.
//!
//! Spawns the devteam binary and verifies output and exit codes.

use std::fs;
use std::process::Command;

use devteam::exit_codes;
use devteam::io::config::{TeamConfig, load_config};
use devteam::test_support::require_python;

fn devteam(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_devteam"));
    cmd.current_dir(dir);
    cmd
}

#[test]
fn exec_success_prints_output_and_exits_ok() {
    require_python();
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("main.py"), "print('hello')\nresult = 7\n").expect("write");

    let output = devteam(temp.path())
        .args(["exec", "main.py"])
        .output()
        .expect("devteam exec");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Code executed successfully. Output:\nhello\n"));
    assert!(stdout.contains("result = 7"));
}

#[test]
fn exec_failure_exits_with_execution_code() {
    require_python();
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("main.py"), "raise ValueError('nope')\n").expect("write");

    let output = devteam(temp.path())
        .args(["exec", "main.py", "--json"])
        .output()
        .expect("devteam exec");

    assert_eq!(output.status.code(), Some(exit_codes::EXECUTION_FAILED));
    let outcome: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json outcome");
    assert_eq!(outcome["status"], "failed");
    assert_eq!(outcome["error_message"], "ValueError: nope");
}

#[test]
fn exec_missing_file_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = devteam(temp.path())
        .args(["exec", "missing.py"])
        .output()
        .expect("devteam exec");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("read source"));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = devteam(temp.path())
        .arg("init")
        .status()
        .expect("devteam init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join("devteam.toml")).expect("load");
    assert_eq!(cfg, TeamConfig::default());

    let again = devteam(temp.path())
        .arg("init")
        .status()
        .expect("devteam init");
    assert_eq!(again.code(), Some(exit_codes::INVALID));
}

#[test]
fn unreachable_generator_exits_with_generation_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("devteam.toml"),
        "[generator]\ncommand = [\"devteam-no-such-model-cli\"]\n",
    )
    .expect("write config");

    let output = devteam(temp.path())
        .args(["design", "A calculator"])
        .output()
        .expect("devteam design");

    assert_eq!(output.status.code(), Some(exit_codes::GENERATION_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("architect completion"));
}
