// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a managed app.
///
/// The set of values is part of the external surface: they are stored
/// verbatim in the state database and shown to any UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    Unknown,
    Installing,
    Installed,
    Starting,
    Running,
    Stopping,
    Error,
}

crate::simple_display! {
    AppStatus {
        Unknown => "UNKNOWN",
        Installing => "INSTALLING",
        Installed => "INSTALLED",
        Starting => "STARTING",
        Running => "RUNNING",
        Stopping => "STOPPING",
        Error => "ERROR",
    }
}

/// A status write was rejected because the transition is not in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status transition {from} -> {to} for app '{app_name}'")]
pub struct InvalidTransition {
    pub app_name: String,
    pub from: AppStatus,
    pub to: AppStatus,
}

impl AppStatus {
    /// Whether the machine allows moving from `self` to `to`.
    ///
    /// Removal is handled separately (`remove` is legal from `Installed`
    /// and `Error`); this only covers status-to-status writes.
    pub fn can_transition(self, to: AppStatus) -> bool {
        use AppStatus::*;
        matches!(
            (self, to),
            (Unknown, Installing)
                | (Installing, Installed)
                | (Installing, Error)
                | (Installed, Starting)
                | (Installed, Error)
                | (Starting, Running)
                | (Starting, Error)
                | (Running, Stopping)
                | (Running, Error)
                | (Stopping, Installed)
                | (Stopping, Error)
                | (Error, Installing)
        )
    }

    /// States in which a live process pid must be recorded.
    pub fn holds_pid(self) -> bool {
        matches!(self, AppStatus::Starting | AppStatus::Running | AppStatus::Stopping)
    }

    /// The only state in which a tunnel URL may be recorded.
    pub fn holds_tunnel(self) -> bool {
        matches!(self, AppStatus::Running)
    }

    /// Parse the stored/displayed form back into a status.
    pub fn parse(s: &str) -> Option<AppStatus> {
        match s {
            "UNKNOWN" => Some(AppStatus::Unknown),
            "INSTALLING" => Some(AppStatus::Installing),
            "INSTALLED" => Some(AppStatus::Installed),
            "STARTING" => Some(AppStatus::Starting),
            "RUNNING" => Some(AppStatus::Running),
            "STOPPING" => Some(AppStatus::Stopping),
            "ERROR" => Some(AppStatus::Error),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
