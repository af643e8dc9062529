// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted per-app record.

use crate::status::AppStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of the `applications` table, the sole persistent description
/// of a managed app.
///
/// The state store is the only writer; everything else reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    /// Unique, non-empty key.
    pub app_name: String,
    pub status: AppStatus,
    /// Directory owned exclusively by this app.
    pub install_path: Option<PathBuf>,
    /// Handle into the environment provisioner, usually equal to `app_name`.
    pub environment_name: Option<String>,
    pub installed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// OS pid of the current process; present iff status holds a pid.
    pub process_pid: Option<i32>,
    /// Public URL; present only while running.
    pub tunnel_url: Option<String>,
    /// Opaque JSON mirrored from the app's `config.json`.
    pub config_blob: Option<String>,
    /// One-line summary of the last failure.
    pub error_message: Option<String>,
}

impl AppRecord {
    /// Check the pid/url coupling invariants on a snapshot.
    ///
    /// `process_pid` present iff the status holds a pid; `tunnel_url`
    /// present only while running; `updated_at >= installed_at`.
    pub fn invariants_hold(&self) -> bool {
        if self.process_pid.is_some() != self.status.holds_pid() {
            return false;
        }
        if self.tunnel_url.is_some() && !self.status.holds_tunnel() {
            return false;
        }
        match (self.installed_at, self.updated_at) {
            (Some(installed), Some(updated)) => updated >= installed,
            _ => true,
        }
    }
}

crate::builder! {
    pub struct AppRecordBuilder => AppRecord {
        into {
            app_name: String = "app",
        }
        set {
            status: AppStatus = AppStatus::Unknown,
        }
        option {
            install_path: PathBuf = None,
            environment_name: String = None,
            installed_at: DateTime<Utc> = None,
            updated_at: DateTime<Utc> = None,
            process_pid: i32 = None,
            tunnel_url: String = None,
            config_blob: String = None,
            error_message: String = None,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
