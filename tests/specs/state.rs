// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-component state properties: FSM paths, pid/url coupling,
//! upsert semantics, concurrent writers.

use super::common::stack;
use berth_core::AppStatus;
use berth_storage::{FieldPatch, StateStoreError};
use std::path::Path;
use std::sync::Arc;

#[test]
fn every_observed_status_sequence_is_a_machine_path() {
    let stk = stack();
    let store = &stk.deps.store;
    store.add("demo", Path::new("/x")).unwrap();

    // Full happy cycle: install, run, stop, rerun, error, reinstall.
    let transitions = [
        (AppStatus::Installed, FieldPatch::default()),
        (AppStatus::Starting, FieldPatch::default().process_pid(10)),
        (AppStatus::Running, FieldPatch::default().process_pid(10)),
        (AppStatus::Stopping, FieldPatch::default().process_pid(10)),
        (AppStatus::Installed, FieldPatch::default()),
        (AppStatus::Starting, FieldPatch::default().process_pid(11)),
        (AppStatus::Error, FieldPatch::default().error_message("crashed")),
    ];
    let mut previous = AppStatus::Installing;
    for (status, patch) in transitions {
        assert!(previous.can_transition(status));
        store.set_status("demo", status, patch).unwrap();
        let record = store.get("demo").unwrap().unwrap();
        assert!(record.invariants_hold(), "invariants broken at {status}");
        previous = status;
    }

    // ERROR -> INSTALLING via re-add.
    store.add("demo", Path::new("/x2")).unwrap();
    assert_eq!(store.get_status("demo").unwrap(), Some(AppStatus::Installing));
}

#[test]
fn upsert_add_resets_path_and_status() {
    let stk = stack();
    let store = &stk.deps.store;
    store.add("app", Path::new("/first")).unwrap();
    store.set_status("app", AppStatus::Installed, FieldPatch::default()).unwrap();

    store.add("app", Path::new("/second")).unwrap();
    let record = store.get("app").unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Installing);
    assert_eq!(record.install_path.as_deref(), Some(Path::new("/second")));
}

#[test]
fn writes_from_many_threads_serialize_cleanly() {
    let stk = stack();
    let store = Arc::clone(&stk.deps.store);
    for i in 0..8 {
        store.add(&format!("app-{i}"), Path::new("/x")).unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            let app = format!("app-{i}");
            store.set_status(&app, AppStatus::Installed, FieldPatch::default()).unwrap();
            store
                .set_status(&app, AppStatus::Starting, FieldPatch::default().process_pid(i))
                .unwrap();
            store
                .set_status(&app, AppStatus::Running, FieldPatch::default().process_pid(i))
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..8 {
        let record = store.get(&format!("app-{i}")).unwrap().unwrap();
        assert_eq!(record.status, AppStatus::Running);
        assert_eq!(record.process_pid, Some(i));
        assert!(record.invariants_hold());
    }
}

#[test]
fn later_writes_win_for_readers() {
    let stk = stack();
    let store = &stk.deps.store;
    store.add("demo", Path::new("/x")).unwrap();
    store.set_status("demo", AppStatus::Installed, FieldPatch::default()).unwrap();
    store
        .set_status("demo", AppStatus::Starting, FieldPatch::default().process_pid(1))
        .unwrap();
    // A reader between two writes sees the first, never a torn mix.
    assert_eq!(store.get_status("demo").unwrap(), Some(AppStatus::Starting));
    store
        .set_status("demo", AppStatus::Running, FieldPatch::default().process_pid(1))
        .unwrap();
    assert_eq!(store.get_status("demo").unwrap(), Some(AppStatus::Running));
}

#[test]
fn rejected_transition_leaves_record_intact() {
    let stk = stack();
    let store = &stk.deps.store;
    store.add("demo", Path::new("/x")).unwrap();
    store.set_status("demo", AppStatus::Installed, FieldPatch::default()).unwrap();

    let err = store
        .set_status("demo", AppStatus::Stopping, FieldPatch::default().process_pid(5))
        .unwrap_err();
    assert!(matches!(err, StateStoreError::Transition(_)));

    let record = store.get("demo").unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Installed);
    assert!(record.process_pid.is_none());
}
