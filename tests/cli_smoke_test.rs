//! Smoke tests for the pfe CLI.
//!
//! These tests verify basic CLI functionality:
//! - `pfe --version` outputs version info
//! - `pfe --help` outputs help text
//! - unknown commands and missing files fail with an error

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    TestEnv::new()
        .pfe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pfe"));
}

#[test]
fn test_help_flag() {
    TestEnv::new()
        .pfe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_set_help_lists_value_kinds() {
    TestEnv::new()
        .pfe()
        .args(["set", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("byte-array"))
        .stdout(predicate::str::contains("--rename-from"));
}

#[test]
fn test_invalid_command() {
    TestEnv::new()
        .pfe()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_cat_missing_file_fails_with_json_error() {
    let env = TestEnv::new();
    env.pfe()
        .args(["cat", "no-such-file.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn test_cat_missing_file_human_error() {
    let env = TestEnv::new();
    env.pfe()
        .args(["-H", "cat", "no-such-file.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}
