// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box checks of the berth binary.

use assert_cmd::Command;

fn berth() -> Command {
    Command::cargo_bin("berth").expect("berth binary")
}

#[test]
fn platform_prints_descriptor_json() {
    let output = berth().arg("platform").output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value.get("platform").is_some());
    assert!(value.get("base_path").is_some());
}

#[test]
fn status_on_fresh_base_reports_no_apps() {
    let tmp = tempfile::tempdir().unwrap();
    let output = berth()
        .arg("--base")
        .arg(tmp.path())
        .arg("status")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no apps installed"));
}

#[test]
fn status_for_unknown_app_fails() {
    let tmp = tempfile::tempdir().unwrap();
    berth()
        .arg("--base")
        .arg(tmp.path())
        .args(["status", "ghost"])
        .assert()
        .failure();
}

#[test]
fn cleanup_runs_on_empty_database() {
    let tmp = tempfile::tempdir().unwrap();
    let output = berth()
        .arg("--base")
        .arg(tmp.path())
        .arg("cleanup")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("removed 0 stale record(s)"));
}

#[test]
fn stop_of_unknown_app_exits_nonzero() {
    let tmp = tempfile::tempdir().unwrap();
    berth()
        .arg("--base")
        .arg(tmp.path())
        .args(["stop", "ghost"])
        .assert()
        .failure();
}
