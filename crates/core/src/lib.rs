// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-core: shared vocabulary for the berth app lifecycle manager.
//!
//! Everything here is plain data: the app status state machine, the
//! persisted record shape, the recipe IR emitted by the translator, the
//! platform descriptor produced by the probe, and the tagged line type
//! every streaming callback consumes.

pub mod macros;

pub mod clock;
pub mod line;
pub mod platform;
pub mod recipe;
pub mod record;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use line::{Line, LineTag, OnLine};
pub use platform::{GpuFacts, Platform, PlatformDescriptor, PlatformQuirks};
pub use recipe::{validate, ErrorHandling, Recipe, RecipeStep, StepKind};
pub use record::AppRecord;
pub use status::{AppStatus, InvalidTransition};

#[cfg(any(test, feature = "test-support"))]
pub use record::AppRecordBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use test_support::LineBuffer;
