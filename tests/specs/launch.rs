// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch, UI detection, tunnel attach, and stop scenarios.

use super::common::{seed_env, stack, wait_until, Stack};
use berth_core::test_support::LineBuffer;
use berth_core::AppStatus;
use berth_engine::LaunchOrchestrator;
use berth_storage::FieldPatch;
use berth_tunnel::TunnelBroker;
use std::sync::Arc;
use std::time::Duration;

/// Register an installed app whose start manifest runs `command`.
fn seed_installed(stk: &Stack, app: &str, command: &str) {
    seed_env(stk, app);
    let app_dir = stk.tmp.path().join("apps").join(app);
    std::fs::create_dir_all(&app_dir).unwrap();
    let manifest = serde_json::to_string(&serde_json::json!([command])).unwrap();
    std::fs::write(app_dir.join("start.json"), manifest).unwrap();

    stk.deps.store.add(app, &app_dir).unwrap();
    stk.deps
        .store
        .set_status(app, AppStatus::Installed, FieldPatch::default().environment_name(app))
        .unwrap();
}

#[test]
fn launch_scan_tunnel_pipeline() {
    let stk = stack();
    // The app announces its UI on stderr, like a development server.
    seed_installed(
        &stk,
        "webapp",
        "echo booting; echo ' * Running on http://127.0.0.1:7860' >&2; sleep 5",
    );

    let buffer = LineBuffer::new();
    let orchestrator = LaunchOrchestrator::new(Arc::clone(&stk.deps));
    let pid = orchestrator.launch("webapp", buffer.sink(), None).unwrap();
    assert!(pid > 0);

    // The broker is asked exactly once, for the announced port.
    assert!(
        wait_until(Duration::from_secs(5), || !stk.broker.opened_ports().is_empty()),
        "tunnel never opened"
    );
    assert_eq!(stk.broker.opened_ports(), vec![7860]);

    // The public url lands in the record while the app is RUNNING.
    assert!(wait_until(Duration::from_secs(2), || {
        stk.deps
            .store
            .get("webapp")
            .ok()
            .flatten()
            .and_then(|r| r.tunnel_url)
            .is_some()
    }));
    let record = stk.deps.store.get("webapp").unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Running);
    assert_eq!(record.process_pid, Some(pid));
    assert_eq!(record.tunnel_url.as_deref(), Some("https://tunnel-7860.fake.dev"));
    assert!(record.invariants_hold());

    stk.deps.processes.kill(pid);
}

#[test]
fn stop_clears_pid_and_url_and_kills_process() {
    let stk = stack();
    seed_installed(
        &stk,
        "webapp",
        "echo ' * Running on http://127.0.0.1:7860' >&2; sleep 30",
    );

    let buffer = LineBuffer::new();
    let orchestrator = LaunchOrchestrator::new(Arc::clone(&stk.deps));
    let pid = orchestrator.launch("webapp", buffer.sink(), None).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        stk.deps
            .store
            .get("webapp")
            .ok()
            .flatten()
            .and_then(|r| r.tunnel_url)
            .is_some()
    }));

    orchestrator.stop("webapp", buffer.sink()).unwrap();

    let record = stk.deps.store.get("webapp").unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Installed);
    assert!(record.process_pid.is_none());
    assert!(record.tunnel_url.is_none());
    assert!(record.invariants_hold());

    // The OS process for the recorded pid is no longer alive.
    assert!(wait_until(Duration::from_secs(5), || {
        stk.deps
            .processes
            .list_all()
            .values()
            .find(|r| r.pid == pid)
            .is_some_and(|r| r.state.is_terminal())
    }));
}

#[test]
fn tunnel_check_detects_dead_tunnel() {
    let stk = stack();
    let url = stk.broker.open(7860).unwrap();
    assert!(stk.deps.broker.check(&url));
    stk.broker.close_all();
    assert!(!stk.deps.broker.check(&url));
}

#[test]
fn scanner_ignores_public_urls_in_launch_output() {
    let stk = stack();
    seed_installed(
        &stk,
        "sneaky",
        "echo 'Running on http://evil.example.com:80'; sleep 2",
    );

    let buffer = LineBuffer::new();
    let orchestrator = LaunchOrchestrator::new(Arc::clone(&stk.deps));
    let pid = orchestrator.launch("sneaky", buffer.sink(), None).unwrap();

    // Give the pipeline a moment: no tunnel may be opened.
    std::thread::sleep(Duration::from_millis(500));
    assert!(stk.broker.opened_ports().is_empty());
    stk.deps.processes.kill(pid);
}
