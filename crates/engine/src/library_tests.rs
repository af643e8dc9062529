// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixture::{fixture, seed_env, Fixture};
use berth_core::test_support::LineBuffer;
use berth_core::{AppStatus, FakeClock};
use berth_storage::FieldPatch;

fn library(fx: &Fixture) -> LibraryOps<FakeClock> {
    LibraryOps::new(Arc::clone(&fx.deps))
}

/// Register an installed app with an install dir and environment.
fn seed_installed(fx: &Fixture, app: &str) -> std::path::PathBuf {
    seed_env(fx, app);
    let app_dir = fx.tmp.path().join("apps").join(app);
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("app.py"), "print('hi')\n").unwrap();
    fx.deps.store.add(app, &app_dir).unwrap();
    fx.deps
        .store
        .set_status(app, AppStatus::Installed, FieldPatch::default().environment_name(app))
        .unwrap();
    app_dir
}

#[test]
fn uninstall_removes_env_files_and_record() {
    let fx = fixture();
    let app_dir = seed_installed(&fx, "demo");
    let env_dir = fx.tmp.path().join("envs").join("demo");
    assert!(env_dir.exists());

    let buffer = LineBuffer::new();
    assert!(library(&fx).uninstall("demo", buffer.sink()));

    assert!(!env_dir.exists(), "environment should be gone");
    assert!(!app_dir.exists(), "install dir should be gone");
    assert!(fx.deps.store.get("demo").unwrap().is_none());
    assert!(buffer.contains("removed from library"));
}

#[test]
fn uninstall_unknown_app_reports_and_returns_false() {
    let fx = fixture();
    let buffer = LineBuffer::new();
    assert!(!library(&fx).uninstall("ghost", buffer.sink()));
    assert!(buffer.contains("not found in library"));
}

#[test]
fn uninstall_survives_environment_failure() {
    let fx = fixture();
    let app_dir = seed_installed(&fx, "demo");
    // Poison the recorded environment name so teardown fails loudly.
    fx.deps
        .store
        .set_status("demo", AppStatus::Starting, FieldPatch::default().process_pid(1))
        .unwrap();
    fx.deps
        .store
        .set_status(
            "demo",
            AppStatus::Error,
            FieldPatch::default().environment_name("bad env name"),
        )
        .unwrap();

    let buffer = LineBuffer::new();
    assert!(library(&fx).uninstall("demo", buffer.sink()));

    // Env teardown failed, everything else proceeded.
    assert!(buffer.contains("environment removal failed for app 'demo'"));
    assert!(buffer.contains("continuing uninstall"));
    assert!(!app_dir.exists());
    assert!(fx.deps.store.get("demo").unwrap().is_none());
}

#[test]
fn get_config_defaults_to_empty_object() {
    let fx = fixture();
    seed_installed(&fx, "demo");
    let config = library(&fx).get_config("demo").unwrap();
    assert_eq!(config, serde_json::json!({}));
}

#[test]
fn set_config_writes_file_and_mirrors_blob() {
    let fx = fixture();
    let app_dir = seed_installed(&fx, "demo");
    let ops = library(&fx);

    let config = serde_json::json!({"port": 7860, "theme": "dark"});
    ops.set_config("demo", &config).unwrap();

    // File on disk, readable back.
    assert!(app_dir.join("config.json").is_file());
    assert_eq!(ops.get_config("demo").unwrap(), config);

    // Mirrored into the record for querying.
    let record = fx.deps.store.get("demo").unwrap().unwrap();
    let blob = record.config_blob.unwrap();
    let mirrored: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(mirrored, config);
}

#[test]
fn config_on_unknown_app_is_not_found() {
    let fx = fixture();
    assert!(matches!(
        library(&fx).get_config("ghost"),
        Err(LibraryError::NotFound(_))
    ));
    assert!(matches!(
        library(&fx).set_config("ghost", &serde_json::json!({})),
        Err(LibraryError::NotFound(_))
    ));
}

#[test]
fn corrupt_config_file_is_reported() {
    let fx = fixture();
    let app_dir = seed_installed(&fx, "demo");
    std::fs::write(app_dir.join("config.json"), "{not json").unwrap();
    assert!(matches!(
        library(&fx).get_config("demo"),
        Err(LibraryError::BadConfig { .. })
    ));
}
