// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capture sinks shared by tests across the workspace.
//!
//! Record builders are generated next to their types via the
//! [`builder!`](crate::builder) macro.

use crate::line::{Line, OnLine};
use parking_lot::Mutex;
use std::sync::Arc;

/// Thread-safe buffer that records every line a sink receives.
#[derive(Clone, Default)]
pub struct LineBuffer {
    lines: Arc<Mutex<Vec<Line>>>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that appends into this buffer.
    pub fn sink(&self) -> OnLine {
        let lines = Arc::clone(&self.lines);
        Arc::new(move |line| lines.lock().push(line.clone()))
    }

    pub fn lines(&self) -> Vec<Line> {
        self.lines.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|l| l.text.clone()).collect()
    }

    /// Texts of lines carrying the given tag, in dispatch order.
    pub fn texts_tagged(&self, tag: crate::line::LineTag) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|l| l.tag == tag)
            .map(|l| l.text.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.text.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}
