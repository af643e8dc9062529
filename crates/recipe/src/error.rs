// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translator error types.

use std::path::PathBuf;
use thiserror::Error;

/// Installer format detected during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Manifest,
    Script,
    Requirements,
}

berth_core::simple_display! {
    ScriptFormat {
        Manifest => "json manifest",
        Script => "installer script",
        Requirements => "requirements list",
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("installer not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported installer format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{format} parse failed at byte {offset} near '{fragment}': {message}")]
    Parse {
        format: ScriptFormat,
        offset: usize,
        fragment: String,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranslateError {
    /// Build a parse error, carving the offending fragment out of the
    /// source for the diagnostic.
    pub(crate) fn parse_at(
        format: ScriptFormat,
        content: &str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let start = offset.min(content.len());
        let mut end = (start + 40).min(content.len());
        while !content.is_char_boundary(end) {
            end += 1;
        }
        let mut begin = start;
        while !content.is_char_boundary(begin) {
            begin -= 1;
        }
        let fragment = content[begin..end].replace('\n', "\\n");
        Self::Parse { format, offset, fragment, message: message.into() }
    }
}
