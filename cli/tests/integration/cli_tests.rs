//! Integration tests for the CLI surface: help, version and usage errors.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn vpsctl() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vpsctl"));
    cmd.env("NO_COLOR", "1").env_remove("VPSCTL_CONFIG");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    vpsctl().assert().code(2).stderr(predicate::str::contains(
        "Provision, deploy to and debug a VPS over interactive SSH",
    ));
}

#[test]
fn test_cli_help_lists_workflows() {
    vpsctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("debug"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    vpsctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vpsctl 0.1.0"));
}

#[test]
fn test_cli_global_flags_in_help() {
    vpsctl()
        .args(["deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_cli_unknown_command_is_usage_error() {
    vpsctl()
        .arg("provision")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_cli_workflows_take_no_arguments() {
    vpsctl().args(["debug", "extra"]).assert().code(2);
}
