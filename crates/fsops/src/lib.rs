// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-fsops: filesystem operations for recipe steps.
//!
//! Atomic writes, streamed downloads, recursive copy/remove, symlinks.
//! Untrusted recipes drive these paths, so every failure names the
//! operation, the path(s) involved, and the underlying cause.

mod download;
mod files;

pub use download::download;
pub use files::{copy, exists, link, mkdir, remove, write};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} failed from {} to {}: {source}", src.display(), dst.display())]
    IoPair {
        op: &'static str,
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy source does not exist: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("atomic write to {} could not be committed: {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download from {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download body read from {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download from {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid download url '{url}': {message}")]
    BadUrl { url: String, message: String },
}
