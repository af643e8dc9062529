// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installer-script extraction: pattern matching, never execution.

use crate::patterns;
use berth_core::{Recipe, RecipeStep, StepKind};
use regex::Regex;

/// Extract API calls from an installer script and emit them in source
/// order. Matches are indexed by byte offset and sorted ascending, so
/// the recipe order is the script order regardless of which pattern
/// matched first.
pub(crate) fn parse(content: &str) -> Recipe {
    let stripped = strip_comments(content);
    let mut calls: Vec<(usize, StepKind)> = Vec::new();

    extract(&patterns::SHELL_RUN, &stripped, &mut calls, |caps| StepKind::Shell {
        command: caps[0].clone(),
    });
    extract(&patterns::FS_DOWNLOAD, &stripped, &mut calls, |caps| StepKind::Download {
        url: caps[0].clone(),
        dest_dir: caps[1].clone(),
    });
    extract(&patterns::FS_COPY, &stripped, &mut calls, |caps| StepKind::Copy {
        src: caps[0].clone(),
        dst: caps[1].clone(),
    });
    extract(&patterns::FS_LINK, &stripped, &mut calls, |caps| StepKind::Link {
        src: caps[0].clone(),
        dst: caps[1].clone(),
    });
    extract(&patterns::FS_WRITE, &stripped, &mut calls, |caps| StepKind::Write {
        path: caps[0].clone(),
        content: caps.get(1).cloned().unwrap_or_default(),
    });
    extract(&patterns::FS_MKDIR, &stripped, &mut calls, |caps| StepKind::Shell {
        command: format!("mkdir -p {}", caps[0]),
    });
    extract(&patterns::OS_CHDIR, &stripped, &mut calls, |caps| StepKind::Shell {
        command: format!("cd {}", caps[0]),
    });
    extract(&patterns::INPUT, &stripped, &mut calls, |caps| StepKind::Input {
        prompt: caps[0].clone(),
        default: caps.get(1).cloned(),
        variable_name: "user_input".to_string(),
    });
    extract(&patterns::GIT_CLONE, &stripped, &mut calls, |caps| {
        let url = &caps[0];
        let dest = caps
            .get(1)
            .cloned()
            .unwrap_or_else(|| default_clone_dest(url));
        StepKind::Shell { command: format!("git clone {url} {dest}") }
    });
    extract(&patterns::NPM_INSTALL, &stripped, &mut calls, |caps| {
        let command = match caps.first() {
            Some(pkg) => format!("npm install {pkg}"),
            None => "npm install".to_string(),
        };
        StepKind::Shell { command }
    });
    extract(&patterns::PIP_INSTALL, &stripped, &mut calls, |caps| StepKind::Shell {
        command: format!("pip install {}", caps[0]),
    });

    // Source order is the execution order.
    calls.sort_by_key(|(offset, _)| *offset);

    calls
        .into_iter()
        .map(|(offset, kind)| RecipeStep::new(kind).at_line(line_of(&stripped, offset)))
        .collect()
}

/// Run one pattern over the script, collecting (offset, step) pairs.
/// `make` receives the capture groups as owned strings (group 1 first).
fn extract(
    pattern: &Regex,
    content: &str,
    out: &mut Vec<(usize, StepKind)>,
    make: impl Fn(&[String]) -> StepKind,
) {
    for m in pattern.captures_iter(content) {
        let caps: Vec<String> = m
            .iter()
            .skip(1)
            .flatten()
            .map(|g| g.as_str().to_string())
            .collect();
        if let Some(whole) = m.get(0) {
            out.push((whole.start(), make(&caps)));
        }
    }
}

fn strip_comments(content: &str) -> String {
    let without_blocks = patterns::BLOCK_COMMENT.replace_all(content, "");
    patterns::LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
}

/// Repo basename without a trailing `.git`, the conventional clone target.
fn default_clone_dest(url: &str) -> String {
    let base = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    base.trim_end_matches(".git").to_string()
}

/// 1-based line of a byte offset within the (preprocessed) source.
fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
        + 1
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
