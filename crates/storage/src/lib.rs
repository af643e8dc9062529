// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-storage: the persistent state store.
//!
//! Sole authority for per-app records. One SQLite file under the config
//! directory, a process-wide mutex around the connection, every write in
//! a transaction, and the status state machine enforced at the write
//! boundary so no caller can persist an invalid transition.

mod store;

pub use store::{FieldPatch, StateStore, StateStoreError, STATE_DB_NAME};
