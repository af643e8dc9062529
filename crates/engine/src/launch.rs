// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch, observe, tunnel, stop.

use crate::report;
use crate::Deps;
use berth_core::{tee, AppStatus, Clock, Line, OnLine, StepKind};
use berth_shell::RunOptions;
use berth_storage::FieldPatch;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use thiserror::Error;

/// Run-script names probed inside the install directory, in priority
/// order.
const RUN_SCRIPT_CANDIDATES: &[&str] = &["start.json", "run.js", "start.js", "run.json"];

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("app '{0}' not found")]
    NotFound(String),

    #[error("app '{app_name}' is {status}, expected {expected}")]
    InvalidState {
        app_name: String,
        status: AppStatus,
        expected: AppStatus,
    },

    #[error("app '{app_name}' has no install path recorded")]
    NoInstallPath { app_name: String },

    #[error(
        "no run script found in {} (expected one of start.json, run.js, start.js, run.json)",
        install_path.display()
    )]
    RunScriptMissing { install_path: PathBuf },

    #[error("run script contains no shell command")]
    NoCommand,

    #[error("app '{app_name}' has no process pid recorded")]
    NoPid { app_name: String },

    #[error("failed to kill process {pid}")]
    KillFailed { pid: i32 },

    #[error(transparent)]
    Translate(#[from] berth_recipe::TranslateError),

    #[error(transparent)]
    Env(#[from] berth_envs::EnvError),

    #[error(transparent)]
    Process(#[from] berth_shell::ProcessError),

    #[error(transparent)]
    State(#[from] berth_storage::StateStoreError),
}

/// Starts installed apps as long-lived background processes, watches
/// their output for the web-UI-ready signal, and attaches a tunnel on
/// the first match.
pub struct LaunchOrchestrator<C: Clock> {
    deps: Arc<Deps<C>>,
}

impl<C: Clock + 'static> LaunchOrchestrator<C> {
    pub fn new(deps: Arc<Deps<C>>) -> Self {
        Self { deps }
    }

    /// Launch `app_name`; returns the spawned pid.
    ///
    /// Every output line goes to `on_line_primary` and, when given,
    /// `on_line_secondary` — both see line N before either sees N+1.
    /// On any failure the app is moved to ERROR and the error returned.
    pub fn launch(
        &self,
        app_name: &str,
        on_line_primary: OnLine,
        on_line_secondary: Option<OnLine>,
    ) -> Result<i32, LaunchError> {
        match self.launch_inner(app_name, on_line_primary.clone(), on_line_secondary) {
            Ok(pid) => Ok(pid),
            Err(e) => {
                report::emit_failure(&on_line_primary, "launch", app_name, &e);
                self.mark_error(app_name, &e);
                Err(e)
            }
        }
    }

    fn launch_inner(
        &self,
        app_name: &str,
        on_line_primary: OnLine,
        on_line_secondary: Option<OnLine>,
    ) -> Result<i32, LaunchError> {
        // Pre-flight: the app must be installed and idle.
        let record = self
            .deps
            .store
            .get(app_name)?
            .ok_or_else(|| LaunchError::NotFound(app_name.to_string()))?;
        if record.status != AppStatus::Installed {
            return Err(LaunchError::InvalidState {
                app_name: app_name.to_string(),
                status: record.status,
                expected: AppStatus::Installed,
            });
        }
        let install_path = record
            .install_path
            .clone()
            .ok_or_else(|| LaunchError::NoInstallPath { app_name: app_name.to_string() })?;

        // Discover and translate the run script.
        let script = find_run_script(&install_path)
            .ok_or_else(|| LaunchError::RunScriptMissing { install_path: install_path.clone() })?;
        let recipe = berth_recipe::translate(&script)?;
        let command = recipe
            .iter()
            .find_map(|step| match &step.kind {
                StepKind::Shell { command } => Some(command.clone()),
                _ => None,
            })
            .ok_or(LaunchError::NoCommand)?;

        // Environment prefix comes from the recorded environment name.
        let env_name = record.environment_name.as_deref().unwrap_or(app_name);
        let prefix = self.deps.envs.prefix(env_name)?;

        self.deps
            .store
            .set_status(app_name, AppStatus::Starting, FieldPatch::default())?;

        // The scanner rides the same stream as the UI: the first line
        // carrying a loopback URL wins, once.
        let scanner_sink = self.spawn_tunnel_watcher(app_name);
        let observed = match on_line_secondary {
            Some(secondary) => tee(on_line_primary.clone(), secondary),
            None => on_line_primary.clone(),
        };
        let sink = tee(observed, scanner_sink);

        let full_command = format!("{prefix} {command}").trim().to_string();
        on_line_primary(&Line::stdout(format!("launching '{app_name}': {full_command}")));
        let opts = RunOptions { cwd: Some(install_path), ..RunOptions::default() };
        let running = self.deps.processes.begin(&full_command, sink, opts)?;
        let pid = running.pid();

        self.deps.store.set_status(
            app_name,
            AppStatus::Running,
            FieldPatch::default().process_pid(pid),
        )?;
        tracing::info!(app = app_name, pid, "app launched");
        Ok(pid)
    }

    /// Stop a running app: STOPPING, kill, back to INSTALLED with pid
    /// and tunnel cleared.
    pub fn stop(&self, app_name: &str, on_line: OnLine) -> Result<(), LaunchError> {
        match self.stop_inner(app_name, on_line.clone()) {
            Ok(()) => Ok(()),
            Err(e) => {
                report::emit_failure(&on_line, "stop", app_name, &e);
                self.mark_error(app_name, &e);
                Err(e)
            }
        }
    }

    fn stop_inner(&self, app_name: &str, on_line: OnLine) -> Result<(), LaunchError> {
        let record = self
            .deps
            .store
            .get(app_name)?
            .ok_or_else(|| LaunchError::NotFound(app_name.to_string()))?;
        if record.status != AppStatus::Running {
            return Err(LaunchError::InvalidState {
                app_name: app_name.to_string(),
                status: record.status,
                expected: AppStatus::Running,
            });
        }
        let pid = record
            .process_pid
            .ok_or_else(|| LaunchError::NoPid { app_name: app_name.to_string() })?;

        self.deps.store.set_status(
            app_name,
            AppStatus::Stopping,
            FieldPatch::default().process_pid(pid),
        )?;
        on_line(&Line::stdout(format!("stopping '{app_name}' (pid {pid})")));

        if !self.deps.processes.kill(pid) {
            return Err(LaunchError::KillFailed { pid });
        }
        self.deps
            .store
            .set_status(app_name, AppStatus::Installed, FieldPatch::default())?;
        on_line(&Line::stdout(format!("'{app_name}' stopped")));
        Ok(())
    }

    /// One-shot watcher: the returned sink scans every line; the first
    /// loopback URL is handed to a detached thread that opens the
    /// tunnel and records the public URL.
    fn spawn_tunnel_watcher(&self, app_name: &str) -> OnLine {
        let (url_tx, url_rx) = mpsc::channel::<String>();
        let matched = AtomicBool::new(false);
        let sink: OnLine = Arc::new(move |line: &Line| {
            if matched.load(Ordering::Relaxed) {
                return;
            }
            if let Some(url) = berth_tunnel::scan(&line.text) {
                if !matched.swap(true, Ordering::Relaxed) {
                    let _ = url_tx.send(url);
                }
            }
        });

        let deps = Arc::clone(&self.deps);
        let app = app_name.to_string();
        std::thread::Builder::new()
            .name("berth-tunnel-attach".to_string())
            .spawn(move || {
                // Sender lives inside the stream sink; the channel dies
                // with the process's streams if no URL ever shows up.
                let Ok(local_url) = url_rx.recv() else {
                    return;
                };
                let Some(port) = berth_tunnel::local_port(&local_url) else {
                    tracing::warn!(app = %app, url = %local_url, "ui-ready url has no port");
                    return;
                };
                tracing::info!(app = %app, port, "web ui detected, opening tunnel");
                match deps.broker.open(port) {
                    Ok(public_url) => record_tunnel(&deps, &app, &public_url),
                    Err(e) => {
                        tracing::error!(app = %app, error = %e, "tunnel open failed");
                    }
                }
            })
            .map(|_| ())
            .unwrap_or_else(|e| tracing::error!(error = %e, "could not spawn tunnel watcher"));
        sink
    }

    fn mark_error(&self, app_name: &str, err: &LaunchError) {
        let result = self.deps.store.set_status(
            app_name,
            AppStatus::Error,
            FieldPatch::default().error_message(report::error_chain(err)),
        );
        if let Err(e) = result {
            tracing::warn!(app = app_name, error = %e, "could not record error state");
        }
    }
}

/// The UI-ready line can race the RUNNING transition by a few
/// milliseconds; retry briefly before giving up on recording the URL.
fn record_tunnel<C: Clock>(deps: &Deps<C>, app: &str, public_url: &str) {
    for _ in 0..20 {
        match deps.store.set_tunnel(app, public_url) {
            Ok(()) => return,
            Err(berth_storage::StateStoreError::TunnelOutsideRunning { .. }) => {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
            Err(e) => {
                tracing::warn!(app, error = %e, "could not record tunnel url");
                return;
            }
        }
    }
    tracing::warn!(app, "app never reached RUNNING, dropping tunnel url");
}

fn find_run_script(install_path: &Path) -> Option<PathBuf> {
    RUN_SCRIPT_CANDIDATES
        .iter()
        .map(|name| install_path.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
