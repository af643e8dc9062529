// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public tunnel brokerage.

use berth_core::{Line, OnLine};
use berth_shell::{ProcessEngine, RunOptions};
use parking_lot::Mutex;
use regex::Regex;
use std::sync::mpsc;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the tunnel provider's auth token.
pub const TUNNEL_AUTH_TOKEN_VAR: &str = "TUNNEL_AUTH_TOKEN";

const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("failed to start tunnel agent for port {port}: {source}")]
    Spawn {
        port: u16,
        #[source]
        source: berth_shell::ProcessError,
    },

    #[error("tunnel agent for port {port} produced no public url within {timeout:?}")]
    OpenTimeout { port: u16, timeout: Duration },
}

/// The "open a public URL for a local port" capability.
///
/// The network transport behind it is an external collaborator; this
/// trait is the whole contract the core consumes.
pub trait TunnelBroker: Send + Sync {
    /// Create a forwarding tunnel to the local port; returns the public URL.
    fn open(&self, local_port: u16) -> Result<String, TunnelError>;

    /// Tear down every outstanding tunnel.
    fn close_all(&self);

    /// Whether the tunnel behind `public_url` still answers.
    fn check(&self, public_url: &str) -> bool;
}

/// Broker configuration. The auth token comes from the init parameter
/// or, when absent, from `TUNNEL_AUTH_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct TunnelConfig {
    pub auth_token: Option<String>,
}

impl TunnelConfig {
    pub fn resolve_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .or_else(|| std::env::var(TUNNEL_AUTH_TOKEN_VAR).ok())
    }
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PUBLIC_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"url=(https?://\S+)").expect("constant regex pattern is valid")
});

/// Process-backed broker: drives the provider's local agent binary and
/// lifts the public URL out of its log stream. Agent log lines are
/// forwarded to the sink given at construction.
pub struct AgentBroker {
    engine: Arc<ProcessEngine>,
    on_line: OnLine,
    token: Option<String>,
    agent_pids: Mutex<Vec<i32>>,
    http: reqwest::blocking::Client,
}

impl AgentBroker {
    pub fn new(config: TunnelConfig, engine: Arc<ProcessEngine>, on_line: OnLine) -> Self {
        Self {
            engine,
            on_line,
            token: config.resolve_token(),
            agent_pids: Mutex::new(Vec::new()),
            http: reqwest::blocking::Client::new(),
        }
    }
}

impl TunnelBroker for AgentBroker {
    fn open(&self, local_port: u16) -> Result<String, TunnelError> {
        let (url_tx, url_rx) = mpsc::channel::<String>();
        let forward = Arc::clone(&self.on_line);
        let sink: OnLine = Arc::new(move |line: &Line| {
            forward(line);
            if let Some(caps) = PUBLIC_URL.captures(&line.text) {
                let _ = url_tx.send(caps[1].to_string());
            }
        });

        let command = format!("ngrok http {local_port} --log stdout --log-format logfmt");
        let mut opts = RunOptions::default();
        if let Some(ref token) = self.token {
            opts.env.push(("NGROK_AUTHTOKEN".to_string(), token.clone()));
        }

        let running = self
            .engine
            .begin(&command, sink, opts)
            .map_err(|source| TunnelError::Spawn { port: local_port, source })?;
        let pid = running.pid();

        match url_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(url) => {
                self.agent_pids.lock().push(pid);
                tracing::info!(port = local_port, url = %url, "tunnel open");
                Ok(url)
            }
            Err(_) => {
                self.engine.kill(pid);
                Err(TunnelError::OpenTimeout { port: local_port, timeout: OPEN_TIMEOUT })
            }
        }
    }

    fn close_all(&self) {
        let pids: Vec<i32> = std::mem::take(&mut *self.agent_pids.lock());
        for pid in pids {
            self.engine.kill(pid);
        }
    }

    fn check(&self, public_url: &str) -> bool {
        self.http
            .head(public_url)
            .timeout(Duration::from_secs(10))
            .send()
            .is_ok()
    }
}

/// In-memory broker for orchestration tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeBroker {
    opened: Mutex<Vec<u16>>,
    closed: Mutex<bool>,
    pub fail_open: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeBroker {
    pub fn new() -> Self {
        Self { opened: Mutex::new(Vec::new()), closed: Mutex::new(false), fail_open: false }
    }

    pub fn failing() -> Self {
        Self { fail_open: true, ..Self::new() }
    }

    pub fn opened_ports(&self) -> Vec<u16> {
        self.opened.lock().clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl TunnelBroker for FakeBroker {
    fn open(&self, local_port: u16) -> Result<String, TunnelError> {
        if self.fail_open {
            return Err(TunnelError::OpenTimeout {
                port: local_port,
                timeout: Duration::from_secs(0),
            });
        }
        self.opened.lock().push(local_port);
        Ok(format!("https://tunnel-{local_port}.fake.dev"))
    }

    fn close_all(&self) {
        *self.closed.lock() = true;
        self.opened.lock().clear();
    }

    fn check(&self, public_url: &str) -> bool {
        !*self.closed.lock()
            && self
                .opened
                .lock()
                .iter()
                .any(|port| public_url.contains(&format!("tunnel-{port}")))
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
