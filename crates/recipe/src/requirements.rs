// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat package-list parsing (`requirements*` files).

use berth_core::{Recipe, RecipeStep};

/// One package specifier per line; `#` comments and blank lines are
/// ignored; each remaining line becomes a `pip install` shell step with
/// the full specifier preserved (version pins, extras, markers).
pub(crate) fn parse(content: &str) -> Recipe {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let spec = raw.trim();
            if spec.is_empty() || spec.starts_with('#') {
                return None;
            }
            Some(
                RecipeStep::shell(format!("pip install {spec}")).at_line(index as u32 + 1),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "requirements_tests.rs"]
mod tests;
