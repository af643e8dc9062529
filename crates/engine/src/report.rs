// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure reporting into line sinks.

use berth_core::{Line, OnLine};
use std::backtrace::Backtrace;
use std::error::Error;

/// Longest stack rendering before frames are elided.
const MAX_STACK_FRAMES: usize = 16;

/// Emit the standard three-line failure trace: a headline naming the
/// operation and app, the error with its cause chain, and the call
/// stack captured here at the reporting site.
pub(crate) fn emit_failure(on_line: &OnLine, operation: &str, app_name: &str, err: &dyn Error) {
    on_line(&Line::error(format!("{operation} failed for app '{app_name}'")));
    on_line(&Line::error(format!("error: {}", error_chain(err))));
    on_line(&Line::error(format!(
        "stack: {}",
        render_stack(&Backtrace::force_capture())
    )));
}

/// Render an error and its source chain, outermost first.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut cursor = err.source();
    while let Some(source) = cursor {
        parts.push(source.to_string());
        cursor = source.source();
    }
    parts.join(" <- ")
}

/// Flatten a captured backtrace into a single line of frames.
///
/// Source-location lines are dropped and deep stacks are elided so the
/// result stays one sink line.
fn render_stack(backtrace: &Backtrace) -> String {
    let rendered = backtrace.to_string();
    let frames: Vec<&str> = rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("at "))
        .collect();
    if frames.is_empty() {
        return rendered.trim().to_string();
    }
    let shown = frames.len().min(MAX_STACK_FRAMES);
    let mut line = frames[..shown].join(" <- ");
    if frames.len() > shown {
        line.push_str(&format!(" <- ... {} more frames", frames.len() - shown));
    }
    line
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
