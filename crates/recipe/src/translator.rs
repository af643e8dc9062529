// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Format dispatch: pick a parser from the installer's file name.

use crate::error::TranslateError;
use crate::{manifest, requirements, script};
use berth_core::Recipe;
use std::path::Path;

/// Translate an installer file into a recipe.
///
/// Dispatch: a basename starting with `requirements` selects the flat
/// package-list parser; a `.json` extension the manifest parser; a `.js`
/// extension the script parser. Anything else is `UnsupportedFormat`,
/// and a missing path is `NotFound`.
pub fn translate(path: &Path) -> Result<Recipe, TranslateError> {
    if !path.exists() {
        return Err(TranslateError::NotFound { path: path.to_path_buf() });
    }

    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let content = std::fs::read_to_string(path)
        .map_err(|source| TranslateError::Io { path: path.to_path_buf(), source })?;

    let recipe = if basename.starts_with("requirements") {
        requirements::parse(&content)
    } else {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => manifest::parse(&content)?,
            Some("js") => script::parse(&content),
            _ => {
                return Err(TranslateError::UnsupportedFormat { path: path.to_path_buf() });
            }
        }
    };

    tracing::debug!(
        path = %path.display(),
        steps = recipe.len(),
        "installer translated"
    );
    Ok(recipe)
}

#[cfg(test)]
#[path = "translator_tests.rs"]
mod tests;
