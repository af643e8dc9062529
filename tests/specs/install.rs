// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Install scenarios: requirements files, structured manifests,
//! failing steps.

use super::common::{seed_env, stack, write_file};
use berth_core::test_support::LineBuffer;
use berth_core::{validate, AppStatus, StepKind};
use berth_engine::InstallOrchestrator;
use std::sync::Arc;

#[test]
fn flat_requirements_file_installs_package_by_package() {
    let stk = stack();
    seed_env(&stk, "pyapp");
    let installer = write_file(
        &stk,
        "requirements.txt",
        "numpy>=1.19.0\npandas\n# comment\nscikit-learn\n",
    );

    let recipe = berth_recipe::translate(&installer).unwrap();
    assert_eq!(recipe.len(), 3);
    for step in &recipe {
        match &step.kind {
            StepKind::Shell { command } => {
                assert!(command.starts_with("pip install "), "command: {command}")
            }
            other => panic!("expected shell step, got {}", other.name()),
        }
    }
    assert!(validate(&recipe));
}

#[test]
fn structured_manifest_installs_end_to_end() {
    let stk = stack();
    seed_env(&stk, "demo");
    // Shell step plus a typed write step standing in for the download
    // (no network in tests; the shapes are identical to the translator).
    let installer = write_file(
        &stk,
        "install.json",
        r#"["echo hi", {"type": "write", "path": "installed.txt", "content": "done"}]"#,
    );

    let recipe = berth_recipe::translate(&installer).unwrap();
    assert_eq!(recipe.len(), 2);
    assert!(validate(&recipe));

    let buffer = LineBuffer::new();
    let orchestrator = InstallOrchestrator::new(Arc::clone(&stk.deps));
    let result = orchestrator.install(&recipe, "demo", buffer.sink(), None, None);

    assert!(result.success, "install failed: {:?}", result.error_message);
    assert_eq!(result.steps_completed, 2);
    assert_eq!(result.total_steps, 2);

    // UNKNOWN -> INSTALLING -> INSTALLED, with the env recorded.
    let record = stk.deps.store.get("demo").unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Installed);
    assert_eq!(record.environment_name.as_deref(), Some("demo"));
    assert!(record.invariants_hold());

    assert!(buffer.contains("hi"));
    let marker = stk.tmp.path().join("apps").join("demo").join("installed.txt");
    assert_eq!(std::fs::read_to_string(marker).unwrap(), "done");
}

#[test]
fn manifest_with_download_step_translates_to_download() {
    let stk = stack();
    let installer = write_file(
        &stk,
        "install.json",
        r#"["echo hi", {"type": "download", "url": "https://x/y.zip", "dest": "/tmp"}]"#,
    );
    let recipe = berth_recipe::translate(&installer).unwrap();
    assert_eq!(recipe.len(), 2);
    assert!(matches!(
        &recipe[1].kind,
        StepKind::Download { url, dest_dir } if url == "https://x/y.zip" && dest_dir == "/tmp"
    ));
    assert!(validate(&recipe));
}

#[test]
fn failing_shell_step_ends_in_error_state() {
    let stk = stack();
    seed_env(&stk, "broken");
    let installer = write_file(
        &stk,
        "install.json",
        r#"["true", "exit 1", "true"]"#,
    );
    let recipe = berth_recipe::translate(&installer).unwrap();

    let buffer = LineBuffer::new();
    let orchestrator = InstallOrchestrator::new(Arc::clone(&stk.deps));
    let result = orchestrator.install(&recipe, "broken", buffer.sink(), None, None);

    assert!(!result.success);
    assert_eq!(result.steps_completed, 1);
    assert_eq!(result.total_steps, 3);
    assert!(result.error_message.unwrap().contains("step 2"));

    assert_eq!(stk.deps.store.get_status("broken").unwrap(), Some(AppStatus::Error));
    assert!(stk.deps.processes.list_active().is_empty());
}

#[test]
fn installer_script_round_trips_through_orchestrator() {
    let stk = stack();
    seed_env(&stk, "scripted");
    let installer = write_file(
        &stk,
        "install.js",
        r#"
// setup
fs.mkdir("data")
shell.run("echo prepared")
fs.write("data/marker.txt", "from-script")
"#,
    );
    let recipe = berth_recipe::translate(&installer).unwrap();
    assert_eq!(recipe.len(), 3);

    let buffer = LineBuffer::new();
    let orchestrator = InstallOrchestrator::new(Arc::clone(&stk.deps));
    let result = orchestrator.install(&recipe, "scripted", buffer.sink(), None, None);
    assert!(result.success, "install failed: {:?}", result.error_message);

    let marker = stk.tmp.path().join("apps").join("scripted").join("data").join("marker.txt");
    assert_eq!(std::fs::read_to_string(marker).unwrap(), "from-script");
}
