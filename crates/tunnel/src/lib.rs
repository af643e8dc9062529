// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-tunnel: UI-ready detection and public tunnel brokerage.
//!
//! The scanner watches launch output for the line where an app's web UI
//! comes up and extracts its loopback URL; the broker turns a local port
//! into a public URL through the configured tunneling provider.

mod broker;
mod scanner;

pub use broker::{AgentBroker, TunnelBroker, TunnelConfig, TunnelError};
pub use scanner::{local_port, scan};

#[cfg(any(test, feature = "test-support"))]
pub use broker::FakeBroker;
