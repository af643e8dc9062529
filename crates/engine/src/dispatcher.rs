// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized job execution.

use crate::install::{InstallOrchestrator, OnInput, OnProgress};
use crate::launch::LaunchOrchestrator;
use crate::library::LibraryOps;
use crate::report;
use crate::Deps;
use berth_core::{validate, Clock, Line, OnLine};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A unit of lifecycle work. Enqueue order is execution order; one job
/// runs at a time.
#[derive(Debug, Clone)]
pub enum Job {
    Install { app_name: String, installer: PathBuf },
    Launch { app_name: String },
    Stop { app_name: String },
    Uninstall { app_name: String },
}

impl Job {
    pub fn app_name(&self) -> &str {
        match self {
            Job::Install { app_name, .. }
            | Job::Launch { app_name }
            | Job::Stop { app_name }
            | Job::Uninstall { app_name } => app_name,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Job::Install { .. } => "install",
            Job::Launch { .. } => "launch",
            Job::Stop { .. } => "stop",
            Job::Uninstall { .. } => "uninstall",
        }
    }
}

/// Listener invoked (with the app name) after every finished job.
pub type StatusListener = Arc<dyn Fn(&str) + Send + Sync>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Single-consumer FIFO over the orchestrators.
///
/// All long-running operations funnel through one background worker, so
/// per-app work never interleaves and every state transition for job N
/// happens before job N+1 starts.
pub struct JobDispatcher {
    tx: mpsc::UnboundedSender<Message>,
    worker: Mutex<Option<std::thread::JoinHandle<()>>>,
    listeners: Arc<Mutex<Vec<StatusListener>>>,
}

impl JobDispatcher {
    /// Start the worker. Lines from every job stream into `sink`;
    /// installs pull interactive answers through `on_input` when given.
    pub fn new<C: Clock + 'static>(
        deps: Arc<Deps<C>>,
        sink: OnLine,
        on_input: Option<OnInput>,
        on_progress: Option<OnProgress>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let listeners: Arc<Mutex<Vec<StatusListener>>> = Arc::new(Mutex::new(Vec::new()));
        let worker = Worker {
            installer: InstallOrchestrator::new(Arc::clone(&deps)),
            launcher: LaunchOrchestrator::new(Arc::clone(&deps)),
            library: LibraryOps::new(deps),
            sink,
            on_input,
            on_progress,
            listeners: Arc::clone(&listeners),
        };
        let handle = std::thread::Builder::new()
            .name("berth-dispatcher".to_string())
            .spawn(move || worker.run(rx))
            .ok();
        if handle.is_none() {
            tracing::error!("could not spawn dispatcher worker");
        }
        Self { tx, worker: Mutex::new(handle), listeners }
    }

    /// Queue a job; returns immediately. False if the worker is gone.
    pub fn enqueue(&self, job: Job) -> bool {
        tracing::debug!(job = job.verb(), app = job.app_name(), "job enqueued");
        self.tx.send(Message::Run(job)).is_ok()
    }

    /// Register a status-changed listener, fired after each job.
    pub fn subscribe(&self, listener: StatusListener) {
        self.listeners.lock().push(listener);
    }

    /// Drain the queue and stop the worker.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

struct Worker<C: Clock> {
    installer: InstallOrchestrator<C>,
    launcher: LaunchOrchestrator<C>,
    library: LibraryOps<C>,
    sink: OnLine,
    on_input: Option<OnInput>,
    on_progress: Option<OnProgress>,
    listeners: Arc<Mutex<Vec<StatusListener>>>,
}

impl<C: Clock + 'static> Worker<C> {
    fn run(self, mut rx: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = rx.blocking_recv() {
            match message {
                Message::Run(job) => {
                    let app = job.app_name().to_string();
                    self.execute(job);
                    for listener in self.listeners.lock().iter() {
                        listener(&app);
                    }
                }
                Message::Shutdown => break,
            }
        }
    }

    /// Run one job to completion. A failing job is reported to the sink
    /// and the worker moves on; nothing escapes.
    fn execute(&self, job: Job) {
        match job {
            Job::Install { app_name, installer } => {
                let recipe = match berth_recipe::translate(&installer) {
                    Ok(recipe) => recipe,
                    Err(e) => {
                        report::emit_failure(&self.sink, "install", &app_name, &e);
                        return;
                    }
                };
                if !validate(&recipe) {
                    self.emit(&format!(
                        "installer for '{app_name}' failed validation, refusing to run"
                    ));
                    return;
                }
                let result = self.installer.install(
                    &recipe,
                    &app_name,
                    Arc::clone(&self.sink),
                    self.on_progress.clone(),
                    self.on_input.clone(),
                );
                if result.success {
                    self.emit(&format!("install of '{app_name}' finished"));
                } else {
                    self.emit(&format!(
                        "install of '{app_name}' failed: {}",
                        result.error_message.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
            Job::Launch { app_name } => {
                if let Ok(pid) =
                    self.launcher.launch(&app_name, Arc::clone(&self.sink), None)
                {
                    self.emit(&format!("'{app_name}' running with pid {pid}"));
                }
                // Failures were already traced to the sink by the
                // orchestrator's capture-transition-rethrow path.
            }
            Job::Stop { app_name } => {
                if self.launcher.stop(&app_name, Arc::clone(&self.sink)).is_ok() {
                    self.emit(&format!("'{app_name}' stopped"));
                }
            }
            Job::Uninstall { app_name } => {
                if self.library.uninstall(&app_name, Arc::clone(&self.sink)) {
                    self.emit(&format!("'{app_name}' uninstalled"));
                }
            }
        }
    }

    fn emit(&self, text: &str) {
        (self.sink)(&Line::stdout(text));
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
