// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    unknown_to_installing = { AppStatus::Unknown, AppStatus::Installing },
    installing_to_installed = { AppStatus::Installing, AppStatus::Installed },
    installing_to_error = { AppStatus::Installing, AppStatus::Error },
    installed_to_starting = { AppStatus::Installed, AppStatus::Starting },
    installed_to_error = { AppStatus::Installed, AppStatus::Error },
    starting_to_running = { AppStatus::Starting, AppStatus::Running },
    starting_to_error = { AppStatus::Starting, AppStatus::Error },
    running_to_stopping = { AppStatus::Running, AppStatus::Stopping },
    running_to_error = { AppStatus::Running, AppStatus::Error },
    stopping_to_installed = { AppStatus::Stopping, AppStatus::Installed },
    stopping_to_error = { AppStatus::Stopping, AppStatus::Error },
    error_to_installing = { AppStatus::Error, AppStatus::Installing },
)]
fn allowed_transitions(from: AppStatus, to: AppStatus) {
    assert!(from.can_transition(to), "{from} -> {to} should be allowed");
}

#[yare::parameterized(
    installed_to_running = { AppStatus::Installed, AppStatus::Running },
    running_to_installed = { AppStatus::Running, AppStatus::Installed },
    unknown_to_running = { AppStatus::Unknown, AppStatus::Running },
    error_to_installed = { AppStatus::Error, AppStatus::Installed },
    stopping_to_running = { AppStatus::Stopping, AppStatus::Running },
    installing_to_starting = { AppStatus::Installing, AppStatus::Starting },
    self_loop_running = { AppStatus::Running, AppStatus::Running },
)]
fn rejected_transitions(from: AppStatus, to: AppStatus) {
    assert!(!from.can_transition(to), "{from} -> {to} should be rejected");
}

#[test]
fn pid_states_match_invariant() {
    for status in [
        AppStatus::Unknown,
        AppStatus::Installing,
        AppStatus::Installed,
        AppStatus::Starting,
        AppStatus::Running,
        AppStatus::Stopping,
        AppStatus::Error,
    ] {
        let expected = matches!(
            status,
            AppStatus::Starting | AppStatus::Running | AppStatus::Stopping
        );
        assert_eq!(status.holds_pid(), expected);
    }
}

#[test]
fn tunnel_only_while_running() {
    assert!(AppStatus::Running.holds_tunnel());
    assert!(!AppStatus::Starting.holds_tunnel());
    assert!(!AppStatus::Installed.holds_tunnel());
}

#[test]
fn display_round_trips_through_parse() {
    for status in [
        AppStatus::Unknown,
        AppStatus::Installing,
        AppStatus::Installed,
        AppStatus::Starting,
        AppStatus::Running,
        AppStatus::Stopping,
        AppStatus::Error,
    ] {
        assert_eq!(AppStatus::parse(&status.to_string()), Some(status));
    }
    assert_eq!(AppStatus::parse("installed"), None);
    assert_eq!(AppStatus::parse(""), None);
}

#[test]
fn serde_uses_screaming_snake_case() {
    let json = serde_json::to_string(&AppStatus::Installing).unwrap();
    assert_eq!(json, "\"INSTALLING\"");
    let parsed: AppStatus = serde_json::from_str("\"RUNNING\"").unwrap();
    assert_eq!(parsed, AppStatus::Running);
}

#[test]
fn invalid_transition_names_the_app() {
    let err = InvalidTransition {
        app_name: "demo".into(),
        from: AppStatus::Installed,
        to: AppStatus::Running,
    };
    let msg = err.to_string();
    assert!(msg.contains("INSTALLED -> RUNNING"));
    assert!(msg.contains("demo"));
}
