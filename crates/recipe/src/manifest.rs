// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured JSON manifest parsing.

use crate::error::{ScriptFormat, TranslateError};
use berth_core::{ErrorHandling, Recipe, RecipeStep, StepKind};
use serde_json::Value;

/// Parse a JSON installer manifest.
///
/// Accepted roots: a list of steps, a map with a `run` list, or a single
/// step map. A list element that is a bare string is a shell step.
pub(crate) fn parse(content: &str) -> Result<Recipe, TranslateError> {
    let root: Value = serde_json::from_str(content).map_err(|e| {
        let offset = offset_of(content, e.line(), e.column());
        TranslateError::parse_at(ScriptFormat::Manifest, content, offset, e.to_string())
    })?;

    let steps: Vec<Value> = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.get("run") {
            Some(Value::Array(_)) => match map.remove("run") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => vec![Value::Object(map)],
        },
        other => {
            return Err(TranslateError::parse_at(
                ScriptFormat::Manifest,
                content,
                0,
                format!("manifest root must be a list or map, got {}", kind_name(&other)),
            ));
        }
    };

    let mut recipe = Vec::with_capacity(steps.len());
    for (index, value) in steps.into_iter().enumerate() {
        match convert_step(&value) {
            Some(step) => recipe.push(step.at_line(index as u32 + 1)),
            None => {
                tracing::warn!(index, "skipping unrecognized manifest step");
            }
        }
    }
    Ok(recipe)
}

/// Convert one manifest element into a step, or `None` when the shape
/// is not recognized.
fn convert_step(value: &Value) -> Option<RecipeStep> {
    if let Value::String(command) = value {
        return Some(RecipeStep::shell(command.clone()));
    }
    let map = value.as_object()?;

    // `{"method": "shell.run", "params": {...}}` form.
    if let Some(method) = map.get("method").and_then(Value::as_str) {
        let empty = Value::Object(serde_json::Map::new());
        let params = map.get("params").unwrap_or(&empty);
        let kind = kind_from_method(method, params)?;
        return Some(with_error_handling(RecipeStep::new(kind), map));
    }

    // `{"type": "download", ...}` form with inline fields.
    if let Some(step_type) = map.get("type").and_then(Value::as_str) {
        let kind = kind_from_type(step_type, value)?;
        return Some(with_error_handling(RecipeStep::new(kind), map));
    }

    // Bare `{"command": "..."}` form.
    if let Some(command) = map.get("command").and_then(Value::as_str) {
        return Some(with_error_handling(RecipeStep::shell(command), map));
    }

    None
}

fn kind_from_method(method: &str, params: &Value) -> Option<StepKind> {
    match method {
        "shell.run" => Some(StepKind::Shell { command: str_field(params, &["command", "cmd"])? }),
        "fs.download" => Some(StepKind::Download {
            url: str_field(params, &["url", "uri"])?,
            dest_dir: str_field(params, &["destination", "dest", "dest_dir"])?,
        }),
        "fs.copy" => Some(StepKind::Copy {
            src: str_field(params, &["source", "src"])?,
            dst: str_field(params, &["destination", "dst", "dest"])?,
        }),
        "fs.link" => Some(StepKind::Link {
            src: str_field(params, &["source", "src"])?,
            dst: str_field(params, &["destination", "dst", "dest"])?,
        }),
        "fs.write" => Some(StepKind::Write {
            path: str_field(params, &["path"])?,
            content: str_field(params, &["content"]).unwrap_or_default(),
        }),
        "fs.mkdir" => Some(StepKind::Mkdir { path: str_field(params, &["path"])? }),
        "fs.rm" => Some(StepKind::Remove { path: str_field(params, &["path"])? }),
        "input" => Some(StepKind::Input {
            prompt: str_field(params, &["prompt"])?,
            default: str_field(params, &["default"]),
            variable_name: str_field(params, &["variable_name"])
                .unwrap_or_else(|| "user_input".to_string()),
        }),
        "env.create" => Some(StepKind::EnvCreate {
            name: str_field(params, &["name"])?,
            kind: str_field(params, &["kind"]),
        }),
        // Recognizably a step, but not one we can map. Kept in the
        // recipe so execution fails loudly instead of skipping it.
        other => Some(StepKind::Unknown { step_type: other.to_string() }),
    }
}

fn kind_from_type(step_type: &str, value: &Value) -> Option<StepKind> {
    match step_type {
        "shell" => Some(StepKind::Shell { command: str_field(value, &["command", "cmd"])? }),
        "download" => Some(StepKind::Download {
            url: str_field(value, &["url", "uri"])?,
            dest_dir: str_field(value, &["dest", "destination", "dest_dir"])?,
        }),
        "write" => Some(StepKind::Write {
            path: str_field(value, &["path"])?,
            content: str_field(value, &["content"]).unwrap_or_default(),
        }),
        "copy" => Some(StepKind::Copy {
            src: str_field(value, &["src", "source"])?,
            dst: str_field(value, &["dst", "dest", "destination"])?,
        }),
        "link" => Some(StepKind::Link {
            src: str_field(value, &["src", "source"])?,
            dst: str_field(value, &["dst", "dest", "destination"])?,
        }),
        "remove" => Some(StepKind::Remove { path: str_field(value, &["path"])? }),
        "mkdir" => Some(StepKind::Mkdir { path: str_field(value, &["path"])? }),
        "input" => Some(StepKind::Input {
            prompt: str_field(value, &["prompt"])?,
            default: str_field(value, &["default"]),
            variable_name: str_field(value, &["variable_name"])
                .unwrap_or_else(|| "user_input".to_string()),
        }),
        "env_create" => Some(StepKind::EnvCreate {
            name: str_field(value, &["name"])?,
            kind: str_field(value, &["kind"]),
        }),
        other => Some(StepKind::Unknown { step_type: other.to_string() }),
    }
}

fn with_error_handling(mut step: RecipeStep, map: &serde_json::Map<String, Value>) -> RecipeStep {
    if map.get("error_handling").and_then(Value::as_str) == Some("continue") {
        step.on_error = ErrorHandling::Continue;
    }
    step
}

/// First present string field among the accepted aliases.
fn str_field(value: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| value.get(n).and_then(Value::as_str))
        .map(str::to_string)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Byte offset of serde's 1-based line/column diagnostics.
fn offset_of(content: &str, line: usize, column: usize) -> usize {
    let mut remaining = line.saturating_sub(1);
    let mut offset = 0;
    for (i, b) in content.bytes().enumerate() {
        if remaining == 0 {
            break;
        }
        if b == b'\n' {
            remaining -= 1;
            offset = i + 1;
        }
    }
    offset + column.saturating_sub(1)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
