// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uninstall scenarios, including partial failure.

use super::common::{seed_env, stack, Stack};
use berth_core::test_support::LineBuffer;
use berth_core::AppStatus;
use berth_engine::LibraryOps;
use berth_storage::FieldPatch;
use std::sync::Arc;

fn seed_installed(stk: &Stack, app: &str) -> std::path::PathBuf {
    seed_env(stk, app);
    let app_dir = stk.tmp.path().join("apps").join(app);
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("app.py"), "print('hi')\n").unwrap();
    stk.deps.store.add(app, &app_dir).unwrap();
    stk.deps
        .store
        .set_status(app, AppStatus::Installed, FieldPatch::default().environment_name(app))
        .unwrap();
    app_dir
}

#[test]
fn clean_uninstall_removes_everything() {
    let stk = stack();
    let app_dir = seed_installed(&stk, "demo");
    let env_dir = stk.tmp.path().join("envs").join("demo");

    let buffer = LineBuffer::new();
    let library = LibraryOps::new(Arc::clone(&stk.deps));
    assert!(library.uninstall("demo", buffer.sink()));

    assert!(!env_dir.exists());
    assert!(!app_dir.exists());
    assert!(stk.deps.store.get("demo").unwrap().is_none());
}

#[test]
fn partial_failure_still_removes_the_record() {
    let stk = stack();
    seed_installed(&stk, "demo");
    // Poison the recorded environment so its teardown fails: the
    // uninstall must report the failure and still drop the record so
    // the app can be reinstalled.
    stk.deps
        .store
        .set_status("demo", AppStatus::Starting, FieldPatch::default().process_pid(1))
        .unwrap();
    stk.deps
        .store
        .set_status(
            "demo",
            AppStatus::Error,
            FieldPatch::default().environment_name("not a valid env"),
        )
        .unwrap();

    let buffer = LineBuffer::new();
    let library = LibraryOps::new(Arc::clone(&stk.deps));
    assert!(library.uninstall("demo", buffer.sink()));

    // The sink heard about the failed substep...
    assert!(buffer.contains("environment removal failed"));
    // ...and the record is gone regardless.
    assert!(stk.deps.store.get("demo").unwrap().is_none());

    // A fresh install of the same name starts clean.
    stk.deps.store.add("demo", &stk.tmp.path().join("apps").join("demo")).unwrap();
    assert_eq!(stk.deps.store.get_status("demo").unwrap(), Some(AppStatus::Installing));
}

#[test]
fn uninstall_with_missing_install_dir_succeeds() {
    let stk = stack();
    seed_env(&stk, "demo");
    let ghost_dir = stk.tmp.path().join("apps").join("demo");
    stk.deps.store.add("demo", &ghost_dir).unwrap();
    stk.deps
        .store
        .set_status("demo", AppStatus::Installed, FieldPatch::default().environment_name("demo"))
        .unwrap();
    // Note: the install dir was never created.

    let buffer = LineBuffer::new();
    let library = LibraryOps::new(Arc::clone(&stk.deps));
    assert!(library.uninstall("demo", buffer.sink()));
    assert!(stk.deps.store.get("demo").unwrap().is_none());
}
