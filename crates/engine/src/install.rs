// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe-driven installation.

use crate::input::{InputRequest, OnInput};
use crate::report;
use crate::Deps;
use berth_core::{AppStatus, Clock, ErrorHandling, Line, OnLine, RecipeStep, StepKind};
use berth_shell::RunOptions;
use berth_storage::FieldPatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Progress callback: 0–100.
pub type OnProgress = Arc<dyn Fn(u8) + Send + Sync>;

/// Outcome of an install run. The orchestrator never fails outward;
/// everything a caller needs is in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub success: bool,
    pub app_name: String,
    pub environment_name: String,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub error_message: Option<String>,
}

#[derive(Debug, Error)]
enum StepError {
    #[error("shell command exited with code {exit_code}")]
    ShellExit { exit_code: i32 },

    #[error(transparent)]
    Fs(#[from] berth_fsops::FsError),

    #[error(transparent)]
    Env(#[from] berth_envs::EnvError),

    #[error("input step has no input callback to drive it")]
    NoInputCallback,

    #[error("user input was empty or missing")]
    InputMissing,

    #[error("step type '{step_type}' not implemented")]
    Unimplemented { step_type: String },
}

/// Walks a recipe against the environment, process, and file
/// subsystems, owning the app's state transitions along the way.
pub struct InstallOrchestrator<C: Clock> {
    deps: Arc<Deps<C>>,
}

impl<C: Clock> InstallOrchestrator<C> {
    pub fn new(deps: Arc<Deps<C>>) -> Self {
        Self { deps }
    }

    /// Install `app_name` from an already-translated recipe.
    ///
    /// Never returns an error: failures are captured into the result,
    /// reported through `on_line`, and reflected in the app's state.
    pub fn install(
        &self,
        recipe: &[RecipeStep],
        app_name: &str,
        on_line: OnLine,
        on_progress: Option<OnProgress>,
        on_input: Option<OnInput>,
    ) -> InstallResult {
        let total_steps = recipe.len();
        let mut result = InstallResult {
            success: false,
            app_name: app_name.to_string(),
            environment_name: app_name.to_string(),
            steps_completed: 0,
            total_steps,
            error_message: None,
        };
        let progress = |value: u8| {
            if let Some(ref cb) = on_progress {
                cb(value);
            }
        };

        on_line(&Line::stdout(format!("starting installation of '{app_name}'")));
        progress(10);

        // Claim the install directory and register the app.
        let install_path = match self.prepare_install_dir(app_name) {
            Ok(path) => path,
            Err(e) => return self.fail(result, &on_line, "could not prepare install directory", &e),
        };
        if let Err(e) = self.deps.store.add(app_name, &install_path) {
            return self.fail(result, &on_line, "could not register app", &e);
        }

        // Isolated environment, named after the app.
        if let Err(e) = self.deps.envs.create(app_name, Arc::clone(&on_line)) {
            report::emit_failure(&on_line, "install", app_name, &e);
            result.error_message = Some("Failed to create application environment".to_string());
            self.mark_error(app_name, result.error_message.as_deref());
            return result;
        }
        progress(50);

        let prefix = match self.deps.envs.prefix(app_name) {
            Ok(prefix) => prefix,
            Err(e) => {
                report::emit_failure(&on_line, "install", app_name, &e);
                result.error_message = Some("Failed to get environment run prefix".to_string());
                self.mark_error(app_name, result.error_message.as_deref());
                return result;
            }
        };

        on_line(&Line::stdout(format!("executing {total_steps} recipe steps")));
        for (index, step) in recipe.iter().enumerate() {
            let step_no = index + 1;
            on_line(&Line::stdout(format!(
                "step {step_no}/{total_steps}: {}",
                step.kind.name()
            )));
            match self.execute_step(step, &prefix, &install_path, &on_line, on_input.as_ref()) {
                Ok(()) => {
                    result.steps_completed = step_no;
                    progress(50 + (step_no * 50 / total_steps.max(1)) as u8);
                }
                Err(e) if step.on_error == ErrorHandling::Continue => {
                    on_line(&Line::error(format!(
                        "step {step_no} failed but is marked continue: {e}"
                    )));
                    result.steps_completed = step_no;
                }
                Err(e) => {
                    report::emit_failure(&on_line, "install", app_name, &e);
                    result.steps_completed = index;
                    result.error_message =
                        Some(format!("step {step_no} ({}) failed: {e}", step.kind.name()));
                    self.mark_error(app_name, result.error_message.as_deref());
                    return result;
                }
            }
        }

        if let Err(e) = self.deps.store.set_status(
            app_name,
            AppStatus::Installed,
            FieldPatch::default().environment_name(app_name),
        ) {
            return self.fail(result, &on_line, "could not record installed state", &e);
        }

        progress(100);
        on_line(&Line::stdout(format!(
            "all {total_steps} steps completed, '{app_name}' installed"
        )));
        result.success = true;
        result
    }

    fn execute_step(
        &self,
        step: &RecipeStep,
        prefix: &str,
        install_path: &Path,
        on_line: &OnLine,
        on_input: Option<&OnInput>,
    ) -> Result<(), StepError> {
        match &step.kind {
            StepKind::Shell { command } => {
                let full = format!("{prefix} {command}").trim().to_string();
                on_line(&Line::stdout(format!("executing: {full}")));
                let opts = RunOptions {
                    cwd: Some(install_path.to_path_buf()),
                    ..RunOptions::default()
                };
                let exit_code = self.deps.processes.run(&full, Arc::clone(on_line), opts);
                if exit_code != 0 {
                    return Err(StepError::ShellExit { exit_code });
                }
                Ok(())
            }
            StepKind::Download { url, dest_dir } => {
                let dest = resolve(install_path, dest_dir);
                berth_fsops::download(url, &dest, Arc::clone(on_line))?;
                Ok(())
            }
            StepKind::Write { path, content } => {
                Ok(berth_fsops::write(&resolve(install_path, path), content)?)
            }
            StepKind::Copy { src, dst } => Ok(berth_fsops::copy(
                &resolve(install_path, src),
                &resolve(install_path, dst),
            )?),
            StepKind::Link { src, dst } => Ok(berth_fsops::link(
                &resolve(install_path, src),
                &resolve(install_path, dst),
            )?),
            StepKind::Remove { path } => Ok(berth_fsops::remove(&resolve(install_path, path))?),
            StepKind::Mkdir { path } => {
                Ok(berth_fsops::mkdir(&resolve(install_path, path), true)?)
            }
            StepKind::Input { prompt, default, variable_name } => {
                let callback = on_input.ok_or(StepError::NoInputCallback)?;
                on_line(&Line::stdout(format!("waiting for user input: {prompt}")));
                let ticket = callback(&InputRequest {
                    prompt: prompt.clone(),
                    default: default.clone(),
                    variable_name: variable_name.clone(),
                });
                match ticket.wait() {
                    Some(value) if !value.trim().is_empty() => {
                        on_line(&Line::stdout(format!("input '{variable_name}' collected")));
                        Ok(())
                    }
                    _ => Err(StepError::InputMissing),
                }
            }
            StepKind::EnvCreate { name, .. } => {
                self.deps.envs.create(name, Arc::clone(on_line))?;
                Ok(())
            }
            StepKind::Unknown { step_type } => {
                Err(StepError::Unimplemented { step_type: step_type.clone() })
            }
        }
    }

    fn prepare_install_dir(&self, app_name: &str) -> Result<PathBuf, berth_fsops::FsError> {
        let path = match self.deps.paths.app_dir(app_name) {
            Ok(path) => path,
            Err(e) => {
                return Err(berth_fsops::FsError::Io {
                    op: "resolve install directory",
                    path: PathBuf::from(app_name),
                    source: std::io::Error::other(e.to_string()),
                })
            }
        };
        berth_fsops::mkdir(&path, true)?;
        Ok(path)
    }

    fn mark_error(&self, app_name: &str, message: Option<&str>) {
        let patch = match message {
            Some(message) => FieldPatch::default().error_message(message),
            None => FieldPatch::default(),
        };
        if let Err(e) = self.deps.store.set_status(app_name, AppStatus::Error, patch) {
            tracing::warn!(app = app_name, error = %e, "could not record error state");
        }
    }

    fn fail(
        &self,
        mut result: InstallResult,
        on_line: &OnLine,
        what: &str,
        err: &dyn std::error::Error,
    ) -> InstallResult {
        report::emit_failure(on_line, "install", &result.app_name, err);
        result.error_message = Some(format!("{what}: {err}"));
        self.mark_error(&result.app_name, result.error_message.as_deref());
        result
    }
}

/// Recipe paths are taken relative to the app's install directory;
/// absolute paths pass through.
fn resolve(install_path: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        install_path.join(path)
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
