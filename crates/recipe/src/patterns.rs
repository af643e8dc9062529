// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Regex library for installer-script API calls.
//!
//! All patterns accept single-, double-, and backtick-quoted string
//! literals and tolerate an optional trailing options object. Comments
//! are stripped by the caller before matching.

use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).expect("constant regex pattern is valid")
}

/// `shell.run("<cmd>" [, {opts}])`
pub(crate) static SHELL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"shell\.run\s*\(\s*['"`]([^'"`]+)['"`]\s*(?:,\s*\{[^}]*\})?\s*\)"#)
});

/// `fs.download("<url>", "<dest>" [, {opts}])`
pub(crate) static FS_DOWNLOAD: LazyLock<Regex> = LazyLock::new(|| {
    compiled(
        r#"fs\.download\s*\(\s*['"`]([^'"`]+)['"`]\s*,\s*['"`]([^'"`]+)['"`]\s*(?:,\s*\{[^}]*\})?\s*\)"#,
    )
});

/// `fs.copy("<src>", "<dst>")`
pub(crate) static FS_COPY: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"fs\.copy\s*\(\s*['"`]([^'"`]+)['"`]\s*,\s*['"`]([^'"`]+)['"`]\s*\)"#)
});

/// `fs.link("<src>", "<dst>")`
pub(crate) static FS_LINK: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"fs\.link\s*\(\s*['"`]([^'"`]+)['"`]\s*,\s*['"`]([^'"`]+)['"`]\s*\)"#)
});

/// `fs.write("<path>", "<content>")`
pub(crate) static FS_WRITE: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"fs\.write\s*\(\s*['"`]([^'"`]+)['"`]\s*,\s*['"`]([^'"`]*)['"`]\s*\)"#)
});

/// `fs.mkdir("<path>")` — convenience wrapper, expands to a shell step.
pub(crate) static FS_MKDIR: LazyLock<Regex> =
    LazyLock::new(|| compiled(r#"fs\.mkdir\s*\(\s*['"`]([^'"`]+)['"`]\s*\)"#));

/// `input("<prompt>" [, "<default>"])`
pub(crate) static INPUT: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"input\s*\(\s*['"`]([^'"`]+)['"`]\s*(?:,\s*['"`]([^'"`]*)['"`])?\s*\)"#)
});

/// `git.clone("<url>" [, "<dest>"])`
pub(crate) static GIT_CLONE: LazyLock<Regex> = LazyLock::new(|| {
    compiled(r#"git\.clone\s*\(\s*['"`]([^'"`]+)['"`]\s*(?:,\s*['"`]([^'"`]+)['"`])?\s*\)"#)
});

/// `npm.install(["<pkg>"])`
pub(crate) static NPM_INSTALL: LazyLock<Regex> =
    LazyLock::new(|| compiled(r#"npm\.install\s*\(\s*(?:['"`]([^'"`]+)['"`])?\s*\)"#));

/// `pip.install("<pkg>")`
pub(crate) static PIP_INSTALL: LazyLock<Regex> =
    LazyLock::new(|| compiled(r#"pip\.install\s*\(\s*['"`]([^'"`]+)['"`]\s*\)"#));

/// `os.chdir("<path>")` — convenience wrapper, expands to a shell step.
pub(crate) static OS_CHDIR: LazyLock<Regex> =
    LazyLock::new(|| compiled(r#"os\.chdir\s*\(\s*['"`]([^'"`]+)['"`]\s*\)"#));

/// `// ...` line comments.
pub(crate) static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| compiled(r"(?m)//[^\n]*"));

/// `/* ... */` block comments.
pub(crate) static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| compiled(r"(?s)/\*.*?\*/"));
