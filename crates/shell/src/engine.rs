// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process table and execution engine.

use crate::reader;
use berth_core::{Line, LineTag, OnLine};
use nix::sys::signal::{kill as send_signal, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::oneshot;

/// Exit code reported when the process could not be spawned at all.
/// Distinguishable from any real exit status and from signal deaths.
pub const SPAWN_FAILURE_CODE: i32 = -257;

/// SIGTERM grace period before escalating to SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(5);
const KILL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start process engine runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal and non-terminal states of a tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Completed,
    Failed,
    Killed,
}

berth_core::simple_display! {
    ProcessState {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Killed => "killed",
    }
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

/// One tracked process. Owned by the engine; external code refers to
/// processes by pid.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: i32,
    pub command: String,
    pub started_at_ms: u64,
    pub state: ProcessState,
    pub exit_code: Option<i32>,
}

/// Spawn options for [`ProcessEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// An in-flight process started by [`ProcessEngine::begin`].
///
/// Dropping the handle detaches it: streaming and table bookkeeping
/// continue on the engine runtime either way.
pub struct Running {
    pid: i32,
    handle: u64,
    exit_rx: oneshot::Receiver<i32>,
}

impl Running {
    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Block (on the calling thread, not the engine runtime) until the
    /// process exits; returns its exit code.
    pub fn wait(self) -> i32 {
        self.exit_rx.blocking_recv().unwrap_or(SPAWN_FAILURE_CODE)
    }
}

/// The process execution engine.
///
/// Owns a dedicated runtime so stream pumping never competes with the
/// caller's threads. The active-process table is a single serialized
/// map; handle generation and insertion happen under its lock,
/// atomically with spawn.
#[derive(Debug)]
pub struct ProcessEngine {
    runtime: tokio::runtime::Runtime,
    table: Arc<Mutex<HashMap<u64, ProcessRecord>>>,
    next_handle: AtomicU64,
}

impl ProcessEngine {
    pub fn new() -> Result<Self, ProcessError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("berth-shell")
            .enable_all()
            .build()
            .map_err(ProcessError::Runtime)?;
        Ok(Self {
            runtime,
            table: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
        })
    }

    /// Spawn `command` through the host shell and stream its output.
    ///
    /// Registers the pid in the active table before returning. The
    /// returned [`Running`] exposes the pid immediately; `wait()` blocks
    /// until exit.
    pub fn begin(
        &self,
        command: &str,
        on_line: OnLine,
        opts: RunOptions,
    ) -> Result<Running, ProcessError> {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        if let Some(ref cwd) = opts.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &opts.env {
            cmd.env(key, value);
        }

        // tokio process spawning needs the engine runtime's reactor.
        let _guard = self.runtime.enter();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let pid = child.id().map(|p| p as i32).unwrap_or(-1);
        let handle = {
            let mut table = self.table.lock();
            let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
            table.insert(
                handle,
                ProcessRecord {
                    pid,
                    command: command.to_string(),
                    started_at_ms: epoch_ms(),
                    state: ProcessState::Running,
                    exit_code: None,
                },
            );
            handle
        };

        tracing::debug!(pid, handle, command, "process spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = stdout.map(|s| {
            self.runtime
                .spawn(reader::pump(s, LineTag::Stdout, Arc::clone(&on_line)))
        });
        let err_task = stderr.map(|s| {
            self.runtime
                .spawn(reader::pump(s, LineTag::Stderr, Arc::clone(&on_line)))
        });

        let (exit_tx, exit_rx) = oneshot::channel();
        let table = Arc::clone(&self.table);
        self.runtime.spawn(async move {
            // Drain both streams before reaping so the trailing partial
            // line is delivered ahead of the exit code.
            if let Some(task) = out_task {
                let _ = task.await;
            }
            if let Some(task) = err_task {
                let _ = task.await;
            }
            let exit_code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    tracing::warn!(pid, error = %e, "wait on child failed");
                    -1
                }
            };
            {
                let mut table = table.lock();
                if let Some(record) = table.get_mut(&handle) {
                    record.exit_code = Some(exit_code);
                    // A kill may have marked the record first; the first
                    // terminal state wins.
                    if record.state == ProcessState::Running {
                        record.state = if exit_code == 0 {
                            ProcessState::Completed
                        } else {
                            ProcessState::Failed
                        };
                    }
                }
            }
            tracing::debug!(pid, exit_code, "process exited");
            let _ = exit_tx.send(exit_code);
        });

        Ok(Running { pid, handle, exit_rx })
    }

    /// Spawn, stream, and block until exit.
    ///
    /// On spawn failure (missing executable, permission denied) the sink
    /// receives synthetic `error`-tagged lines and the distinguished
    /// [`SPAWN_FAILURE_CODE`] is returned instead of an error.
    pub fn run(&self, command: &str, on_line: OnLine, opts: RunOptions) -> i32 {
        match self.begin(command, Arc::clone(&on_line), opts) {
            Ok(running) => running.wait(),
            Err(e) => {
                tracing::error!(command, error = %e, "spawn failed");
                on_line(&Line::error(format!("failed to spawn: {command}")));
                on_line(&Line::error(e.to_string()));
                SPAWN_FAILURE_CODE
            }
        }
    }

    /// Snapshot of non-terminal processes: engine handle -> pid.
    pub fn list_active(&self) -> HashMap<u64, i32> {
        self.table
            .lock()
            .iter()
            .filter(|(_, r)| !r.state.is_terminal())
            .map(|(&h, r)| (h, r.pid))
            .collect()
    }

    /// Full records, terminal ones included until [`compact`](Self::compact).
    pub fn list_all(&self) -> HashMap<u64, ProcessRecord> {
        self.table.lock().clone()
    }

    /// Best-effort graceful kill: SIGTERM, wait up to the grace period,
    /// SIGKILL if still alive. Killing a terminal or unknown pid
    /// succeeds.
    pub fn kill(&self, pid: i32) -> bool {
        let handle = {
            let table = self.table.lock();
            table
                .iter()
                .find(|(_, r)| r.pid == pid && !r.state.is_terminal())
                .map(|(&h, _)| h)
        };
        let Some(handle) = handle else {
            // Not ours or already dead; kill is idempotent.
            return true;
        };

        tracing::info!(pid, "terminating process");
        match send_signal(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => {}
            Err(nix::errno::Errno::ESRCH) => {
                // Exited between lookup and signal.
                self.mark_killed(handle);
                return true;
            }
            Err(e) => {
                tracing::error!(pid, error = %e, "SIGTERM failed");
                return false;
            }
        }

        if !self.wait_for_terminal(handle, kill_grace()) {
            tracing::warn!(pid, "grace period expired, escalating to SIGKILL");
            if let Err(e) = send_signal(Pid::from_raw(pid), Signal::SIGKILL) {
                if e != nix::errno::Errno::ESRCH {
                    tracing::error!(pid, error = %e, "SIGKILL failed");
                    return false;
                }
            }
            self.wait_for_terminal(handle, Duration::from_secs(1));
        }
        self.mark_killed(handle);
        true
    }

    /// Drop terminal records from the table.
    pub fn compact(&self) {
        self.table.lock().retain(|_, r| !r.state.is_terminal());
    }

    /// Kill every non-terminal process.
    pub fn shutdown(&self) {
        let pids: Vec<i32> = self.list_active().into_values().collect();
        for pid in pids {
            self.kill(pid);
        }
    }

    fn wait_for_terminal(&self, handle: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let table = self.table.lock();
                match table.get(&handle) {
                    Some(r) if r.state.is_terminal() => return true,
                    None => return true,
                    Some(_) => {}
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(KILL_POLL);
        }
    }

    // A clean exit that raced ahead of the signal stays Completed;
    // everything else the kill touched is recorded as Killed.
    fn mark_killed(&self, handle: u64) {
        let mut table = self.table.lock();
        if let Some(record) = table.get_mut(&handle) {
            if record.state != ProcessState::Completed {
                record.state = ProcessState::Killed;
            }
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Grace period, overridable for tests via BERTH_KILL_GRACE_MS.
fn kill_grace() -> Duration {
    std::env::var("BERTH_KILL_GRACE_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(KILL_GRACE)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
