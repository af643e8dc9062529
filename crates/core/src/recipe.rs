// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe IR: the uniform, totally ordered form every installer or run
//! script is translated into.

use serde::{Deserialize, Serialize};

/// A translated script: steps in source order.
pub type Recipe = Vec<RecipeStep>;

/// What to do when a step fails. `Stop` aborts the recipe (the default);
/// `Continue` is a rare per-step hint carried through from the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    #[default]
    Stop,
    Continue,
}

impl ErrorHandling {
    pub fn is_stop(&self) -> bool {
        matches!(self, ErrorHandling::Stop)
    }
}

/// One step of a recipe.
///
/// Serialized as `{"step_type": ..., "params": {...}}` with the optional
/// diagnostics fields alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    #[serde(flatten)]
    pub kind: StepKind,
    /// Line in the (preprocessed) source the step was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<u32>,
    #[serde(default, skip_serializing_if = "ErrorHandling::is_stop")]
    pub on_error: ErrorHandling,
}

/// Tagged step payloads. Convenience installer calls (`git.clone`,
/// `pip.install`, `npm.install`) are expanded to `Shell` at translation
/// time and never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step_type", content = "params", rename_all = "snake_case")]
pub enum StepKind {
    Shell {
        command: String,
    },
    Download {
        url: String,
        dest_dir: String,
    },
    Write {
        path: String,
        content: String,
    },
    Copy {
        src: String,
        dst: String,
    },
    Link {
        src: String,
        dst: String,
    },
    Remove {
        path: String,
    },
    Mkdir {
        path: String,
    },
    Input {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        variable_name: String,
    },
    EnvCreate {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
    },
    /// A tag the translator recognized as a step but could not map.
    /// Executing one is an explicit error, never a silent no-op.
    Unknown {
        step_type: String,
    },
}

impl StepKind {
    /// Stable tag name, matching the serialized `step_type`.
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Shell { .. } => "shell",
            StepKind::Download { .. } => "download",
            StepKind::Write { .. } => "write",
            StepKind::Copy { .. } => "copy",
            StepKind::Link { .. } => "link",
            StepKind::Remove { .. } => "remove",
            StepKind::Mkdir { .. } => "mkdir",
            StepKind::Input { .. } => "input",
            StepKind::EnvCreate { .. } => "env_create",
            StepKind::Unknown { .. } => "unknown",
        }
    }
}

impl RecipeStep {
    pub fn new(kind: StepKind) -> Self {
        Self { kind, source_line: None, on_error: ErrorHandling::Stop }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Self::new(StepKind::Shell { command: command.into() })
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }

    /// First missing/empty required field of this step, if any.
    fn first_violation(&self) -> Option<&'static str> {
        fn empty(s: &str) -> bool {
            s.trim().is_empty()
        }
        match &self.kind {
            StepKind::Shell { command } if empty(command) => Some("command"),
            StepKind::Download { url, .. } if empty(url) => Some("url"),
            StepKind::Download { dest_dir, .. } if empty(dest_dir) => Some("dest_dir"),
            StepKind::Write { path, .. } if empty(path) => Some("path"),
            StepKind::Write { content, .. } if empty(content) => Some("content"),
            StepKind::Copy { src, .. } if empty(src) => Some("src"),
            StepKind::Copy { dst, .. } if empty(dst) => Some("dst"),
            StepKind::Link { src, .. } if empty(src) => Some("src"),
            StepKind::Link { dst, .. } if empty(dst) => Some("dst"),
            StepKind::Remove { path } if empty(path) => Some("path"),
            StepKind::Mkdir { path } if empty(path) => Some("path"),
            StepKind::Input { prompt, .. } if empty(prompt) => Some("prompt"),
            StepKind::Input { variable_name, .. } if empty(variable_name) => {
                Some("variable_name")
            }
            StepKind::EnvCreate { name, .. } if empty(name) => Some("name"),
            _ => None,
        }
    }
}

/// Check a recipe against the required-fields table.
///
/// Returns false for an empty recipe or on the first step with a missing
/// or empty required field; the violation is logged, not returned.
pub fn validate(recipe: &[RecipeStep]) -> bool {
    if recipe.is_empty() {
        tracing::warn!("recipe validation failed: recipe is empty");
        return false;
    }
    for (index, step) in recipe.iter().enumerate() {
        if let Some(field) = step.first_violation() {
            tracing::warn!(
                step = index + 1,
                step_type = step.kind.name(),
                field,
                "recipe validation failed: required field empty or missing"
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
#[path = "recipe_tests.rs"]
mod tests;
