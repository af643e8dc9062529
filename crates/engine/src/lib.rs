// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-engine: lifecycle orchestration.
//!
//! The install orchestrator walks recipes against the environment,
//! process, and file subsystems; the launch orchestrator starts apps and
//! attaches tunnels when their UI comes up; library ops handle uninstall
//! and per-app config; the job dispatcher serializes all of it behind a
//! single worker.

mod dispatcher;
mod input;
mod install;
mod launch;
mod library;
mod report;
#[cfg(test)]
mod test_fixture;

pub use dispatcher::{Job, JobDispatcher, StatusListener};
pub use input::{InputFulfiller, InputRequest, InputTicket, OnInput};
pub use install::{InstallOrchestrator, InstallResult, OnProgress};
pub use launch::{LaunchError, LaunchOrchestrator};
pub use library::{LibraryError, LibraryOps};

use berth_core::Clock;
use berth_envs::EnvProvisioner;
use berth_platform::PathResolver;
use berth_shell::ProcessEngine;
use berth_storage::StateStore;
use berth_tunnel::TunnelBroker;
use std::sync::Arc;

/// Shared subsystem handles threaded through every orchestrator.
pub struct Deps<C: Clock> {
    pub store: Arc<StateStore<C>>,
    pub envs: Arc<EnvProvisioner>,
    pub processes: Arc<ProcessEngine>,
    pub paths: PathResolver,
    pub broker: Arc<dyn TunnelBroker>,
}
