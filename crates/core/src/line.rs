// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tagged output lines — the universal streaming channel of the core.

use std::sync::Arc;

/// Origin of a streamed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineTag {
    Stdout,
    Stderr,
    /// Synthetic diagnostics (spawn failures, component error traces).
    Error,
}

crate::simple_display! {
    LineTag {
        Stdout => "stdout",
        Stderr => "stderr",
        Error => "error",
    }
}

/// One completed line of process or component output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tag: LineTag,
    pub text: String,
}

impl Line {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Stdout, text: text.into() }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Stderr, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { tag: LineTag::Error, text: text.into() }
    }
}

/// Shared line sink. Components accept this as an explicit capability
/// parameter — never a global — and may invoke it from worker threads.
pub type OnLine = Arc<dyn Fn(&Line) + Send + Sync>;

/// A sink that drops everything, for callers that don't care.
pub fn null_sink() -> OnLine {
    Arc::new(|_| {})
}

/// Tee a line into two sinks: both observe line N before either observes
/// line N+1; relative order for the same line is unspecified.
pub fn tee(primary: OnLine, secondary: OnLine) -> OnLine {
    Arc::new(move |line| {
        primary(line);
        secondary(line);
    })
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
