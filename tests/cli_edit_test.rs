//! Integration tests for the editing commands: set, rm, get, keys, cat.
//!
//! These run against files the test user owns, so the full save protocol
//! (stage, rename, chmod, chown-to-self) executes without privileges. No
//! consumer process is named, so nothing gets terminated.

#![cfg(unix)]

mod common;

use common::TestEnv;
use predicates::prelude::*;

const SAMPLE: &str = r#"<?xml version='1.0' encoding='utf-8' standalone='yes' ?>
<map>
    <int name="count" value="4" />
    <string name="title">hello</string>
</map>
"#;

#[test]
fn test_set_creates_file_and_get_reads_it_back() {
    let env = TestEnv::new();

    env.pfe()
        .args(["set", "settings.xml", "count", "4", "--type", "int"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"saved\": true"));

    env.pfe()
        .args(["get", "settings.xml", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"int\""))
        .stdout(predicate::str::contains("\"value\": 4"));
}

#[test]
fn test_set_all_value_kinds_round_trip() {
    let env = TestEnv::new();
    let cases = [
        ("title", "hello world", "string", "\"hello world\""),
        ("enabled", "true", "boolean", "true"),
        ("count", "-3", "int", "-3"),
        ("stamp", "1706000000000", "long", "1706000000000"),
        ("scale", "1.5", "float", "1.5"),
        ("ratio", "0.25", "double", "0.25"),
        ("blob", "0aff", "byte-array", "\"0aff\""),
        ("tags", "beta,alpha", "set", "\"alpha\""),
    ];

    for (key, value, kind, _) in &cases {
        env.pfe()
            .args(["set", "all.xml", key, value, "--type", kind])
            .assert()
            .success();
    }
    for (key, _, kind, expect) in &cases {
        env.pfe()
            .args(["get", "all.xml", key])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("\"type\": \"{}\"", kind)))
            .stdout(predicate::str::contains(*expect));
    }
}

#[test]
fn test_file_mode_is_0660_after_save() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    env.pfe()
        .args(["set", "settings.xml", "a", "1", "--type", "int"])
        .assert()
        .success();

    let mode = env.file("settings.xml").metadata().unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o660);
}

#[test]
fn test_cat_lists_entries() {
    let env = TestEnv::new();
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["cat", "settings.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 2"))
        .stdout(predicate::str::contains("\"title\""));

    env.pfe()
        .args(["-H", "cat", "settings.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count (int) = 4"))
        .stdout(predicate::str::contains("title (string) = hello"));
}

#[test]
fn test_cat_tolerates_malformed_file() {
    // The editor policy: undecodable content is shown as an empty store,
    // not an error. `validate` is the strict counterpart.
    let env = TestEnv::new();
    env.write_file("broken.xml", "<map><int name=\"x\"");

    env.pfe()
        .args(["cat", "broken.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 0"));

    env.pfe()
        .args(["validate", "broken.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_validate_accepts_blank_file() {
    let env = TestEnv::new();
    env.write_file("blank.xml", "   \n  ");

    env.pfe()
        .args(["validate", "blank.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("\"entries\": 0"));
}

#[test]
fn test_keys_are_sorted_after_reload() {
    let env = TestEnv::new();
    for key in ["zeta", "alpha", "mid"] {
        env.pfe()
            .args(["set", "ordered.xml", key, "1", "--type", "int"])
            .assert()
            .success();
    }

    // Display order is an in-memory editing concern and is not persisted;
    // a fresh load derives it from the keys.
    env.pfe()
        .args(["-H", "keys", "ordered.xml"])
        .assert()
        .success()
        .stdout(predicate::str::diff("alpha\nmid\nzeta\n"));
}

#[test]
fn test_set_existing_key_overwrites() {
    let env = TestEnv::new();
    env.pfe()
        .args(["set", "settings.xml", "count", "1", "--type", "int"])
        .assert()
        .success();
    env.pfe()
        .args(["set", "settings.xml", "count", "2", "--type", "int"])
        .assert()
        .success();

    env.pfe()
        .args(["get", "settings.xml", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\": 2"));

    // Still a single entry, not two.
    env.pfe()
        .args(["cat", "settings.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"));
}

#[test]
fn test_rename_moves_value_to_new_key() {
    let env = TestEnv::new();
    env.pfe()
        .args(["set", "settings.xml", "old_name", "7", "--type", "int"])
        .assert()
        .success();

    env.pfe()
        .args([
            "set",
            "settings.xml",
            "new_name",
            "7",
            "--type",
            "int",
            "--rename-from",
            "old_name",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"renamed_from\": \"old_name\""));

    env.pfe()
        .args(["get", "settings.xml", "old_name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key not found"));

    env.pfe()
        .args(["get", "settings.xml", "new_name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\": 7"));
}

#[test]
fn test_rm_removes_entry() {
    let env = TestEnv::new();
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["rm", "settings.xml", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"existed\": true"));

    env.pfe()
        .args(["cat", "settings.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"));
}

#[test]
fn test_rm_missing_key_succeeds() {
    let env = TestEnv::new();
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["rm", "settings.xml", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"existed\": false"));
}

#[test]
fn test_backup_flag_writes_bak_file() {
    let env = TestEnv::new();
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["set", "settings.xml", "count", "5", "--type", "int", "--backup"])
        .assert()
        .success();

    let backup = std::fs::read_to_string(env.file("settings.xml.bak")).unwrap();
    assert_eq!(backup, SAMPLE);
}

#[test]
fn test_config_switches_default_output_to_human() {
    let env = TestEnv::new();
    env.write_config("output-format = \"human\"\n");
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["cat", "settings.xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count (int) = 4"));
}

#[test]
fn test_broken_config_warns_but_still_runs() {
    let env = TestEnv::new();
    env.write_config("output-format = 12\n");
    env.write_file("settings.xml", SAMPLE);

    env.pfe()
        .args(["cat", "settings.xml"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning:"));
}

#[test]
fn test_set_rejects_bad_value_for_kind() {
    let env = TestEnv::new();
    env.pfe()
        .args(["set", "settings.xml", "count", "many", "--type", "int"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid int"));
    assert!(!env.file("settings.xml").exists(), "no file on failed set");
}
