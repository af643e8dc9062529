// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendezvous for user-interactive recipe steps.
//!
//! The orchestrator hands the step parameters to the caller's `on_input`
//! and receives a ticket back; the caller fulfills the ticket from
//! whatever surface drives it (a GUI prompt, a terminal read), and the
//! orchestrator blocks on the ticket until then. The wait is unbounded:
//! the user may take as long as they like.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Parameters of an `input` step, as handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    pub prompt: String,
    pub default: Option<String>,
    pub variable_name: String,
}

/// Callback invoked for each `input` step; returns the ticket the
/// orchestrator will block on.
pub type OnInput = Arc<dyn Fn(&InputRequest) -> InputTicket + Send + Sync>;

struct Slot {
    // None = not fulfilled yet; Some(inner) = fulfilled with inner value.
    value: Mutex<Option<Option<String>>>,
    ready: Condvar,
}

/// Blocking side of the rendezvous.
pub struct InputTicket {
    slot: Arc<Slot>,
}

/// Fulfilling side of the rendezvous.
#[derive(Clone)]
pub struct InputFulfiller {
    slot: Arc<Slot>,
}

impl InputTicket {
    /// Create a connected ticket/fulfiller pair.
    pub fn pair() -> (InputTicket, InputFulfiller) {
        let slot = Arc::new(Slot { value: Mutex::new(None), ready: Condvar::new() });
        (InputTicket { slot: Arc::clone(&slot) }, InputFulfiller { slot })
    }

    /// A ticket that is already fulfilled; convenient for tests and
    /// non-interactive callers.
    pub fn ready(value: Option<String>) -> InputTicket {
        let (ticket, fulfiller) = Self::pair();
        fulfiller.fulfill(value);
        ticket
    }

    /// Block until fulfilled; returns the supplied value.
    pub fn wait(&self) -> Option<String> {
        let mut guard = self.slot.value.lock();
        while guard.is_none() {
            self.slot.ready.wait(&mut guard);
        }
        guard.clone().unwrap_or(None)
    }
}

impl InputFulfiller {
    /// Supply the result. `None` (or an empty string) means the user
    /// declined or the surface failed; the step will fail.
    pub fn fulfill(&self, value: Option<String>) {
        let mut guard = self.slot.value.lock();
        *guard = Some(value);
        self.slot.ready.notify_all();
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
