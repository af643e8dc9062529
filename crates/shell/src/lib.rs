// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-shell: the non-blocking process execution engine.
//!
//! Spawns shell subprocesses on a dedicated runtime, fans stdout/stderr
//! into a line callback in real time, tracks pids in a serialized table,
//! and provides best-effort graceful kill.

mod engine;
mod reader;

pub use engine::{
    ProcessEngine, ProcessError, ProcessRecord, ProcessState, RunOptions, Running,
    SPAWN_FAILURE_CODE,
};
