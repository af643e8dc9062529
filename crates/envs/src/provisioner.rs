// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment creation, prefixes, listing, destruction.

use berth_core::{Line, OnLine, PlatformDescriptor};
use berth_shell::{ProcessEngine, RunOptions};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment name '{name}' is empty or contains shell metacharacters")]
    InvalidName { name: String },

    #[error("no isolation backend available on this platform")]
    NoBackend,

    #[error("failed to create environment '{name}': exit code {exit_code}")]
    CreateFailed { name: String, exit_code: i32 },

    #[error("failed to destroy environment '{name}': exit code {exit_code}")]
    DestroyFailed { name: String, exit_code: i32 },

    #[error("failed to list environments: {message}")]
    ListFailed { message: String },

    #[error("environment directory error for '{name}': {source}")]
    Dir {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which isolation backend this provisioner drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvBackend {
    Conda,
    Venv,
}

berth_core::simple_display! {
    EnvBackend {
        Conda => "conda",
        Venv => "venv",
    }
}

/// Creates and destroys per-app environments and builds the command
/// prefix that runs a command inside one.
#[derive(Debug)]
pub struct EnvProvisioner {
    backend: EnvBackend,
    envs_dir: PathBuf,
    engine: Arc<ProcessEngine>,
}

impl EnvProvisioner {
    /// Select a backend from the platform descriptor. Conda is the
    /// default for AI/ML dependency isolation; venv is the fallback
    /// where conda is unsupported.
    pub fn new(
        descriptor: &PlatformDescriptor,
        envs_dir: PathBuf,
        engine: Arc<ProcessEngine>,
    ) -> Result<Self, EnvError> {
        let backend = if descriptor.supports_conda {
            EnvBackend::Conda
        } else if descriptor.supports_venv {
            EnvBackend::Venv
        } else {
            return Err(EnvError::NoBackend);
        };
        tracing::info!(backend = %backend, "environment backend selected");
        Ok(Self { backend, envs_dir, engine })
    }

    pub fn backend(&self) -> EnvBackend {
        self.backend
    }

    /// Create the environment `name`, streaming backend output.
    ///
    /// Idempotent: an environment that already exists is reported
    /// through the sink and treated as success.
    pub fn create(&self, name: &str, on_line: OnLine) -> Result<i32, EnvError> {
        let name = validated(name)?;

        if self.exists(&name)? {
            on_line(&Line::stdout(format!(
                "environment '{name}' already exists, reusing it"
            )));
            return Ok(0);
        }

        let command = match self.backend {
            EnvBackend::Conda => format!("conda create -n {name} python=3.10 -y"),
            EnvBackend::Venv => {
                format!("python3 -m venv {}", self.envs_dir.join(&name).display())
            }
        };
        on_line(&Line::stdout(format!("creating {} environment '{name}'", self.backend)));

        let exit_code = self.engine.run(&command, on_line, RunOptions::default());
        if exit_code != 0 {
            return Err(EnvError::CreateFailed { name, exit_code });
        }
        tracing::info!(env = %name, backend = %self.backend, "environment created");
        Ok(exit_code)
    }

    /// Command prefix that executes a command inside `name`.
    ///
    /// Opaque to callers: concatenating `prefix + " " + cmd` yields a
    /// shell command that runs `cmd` in the environment.
    pub fn prefix(&self, name: &str) -> Result<String, EnvError> {
        let name = validated(name)?;
        Ok(match self.backend {
            EnvBackend::Conda => format!("conda run -n {name} --"),
            EnvBackend::Venv => {
                format!(". {}/bin/activate &&", self.envs_dir.join(&name).display())
            }
        })
    }

    /// Names of existing environments.
    pub fn list(&self) -> Result<Vec<String>, EnvError> {
        match self.backend {
            EnvBackend::Venv => {
                let mut names = Vec::new();
                let entries = std::fs::read_dir(&self.envs_dir).map_err(|source| {
                    EnvError::Dir { name: String::new(), source }
                })?;
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.join("bin").join("activate").is_file() {
                        names.push(entry.file_name().to_string_lossy().to_string());
                    }
                }
                names.sort();
                Ok(names)
            }
            EnvBackend::Conda => {
                let output = CollectedOutput::default();
                let exit_code = self.engine.run(
                    "conda env list --json",
                    output.sink(),
                    RunOptions::default(),
                );
                if exit_code != 0 {
                    return Err(EnvError::ListFailed {
                        message: format!("conda env list exited with {exit_code}"),
                    });
                }
                parse_conda_env_list(&output.stdout())
            }
        }
    }

    /// Destroy the environment; removing one that does not exist is not
    /// an error.
    pub fn destroy(&self, name: &str, on_line: OnLine) -> Result<(), EnvError> {
        let name = validated(name)?;
        match self.backend {
            EnvBackend::Conda => {
                let command = format!("conda env remove -n {name} -y");
                let exit_code = self.engine.run(&command, on_line, RunOptions::default());
                if exit_code != 0 {
                    return Err(EnvError::DestroyFailed { name, exit_code });
                }
            }
            EnvBackend::Venv => {
                let path = self.envs_dir.join(&name);
                if path.is_dir() {
                    std::fs::remove_dir_all(&path)
                        .map_err(|source| EnvError::Dir { name: name.clone(), source })?;
                }
                on_line(&Line::stdout(format!("removed environment directory for '{name}'")));
            }
        }
        tracing::info!(env = %name, "environment destroyed");
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool, EnvError> {
        match self.backend {
            EnvBackend::Venv => {
                Ok(self.envs_dir.join(name).join("bin").join("activate").is_file())
            }
            EnvBackend::Conda => Ok(self.list()?.iter().any(|n| n == name)),
        }
    }
}

/// `{"envs": ["/path/to/base", "/path/to/envs/name", ...]}` — the base
/// environment is listed too and is filtered out by keeping basenames
/// under an `envs` directory.
fn parse_conda_env_list(stdout: &str) -> Result<Vec<String>, EnvError> {
    let value: serde_json::Value = serde_json::from_str(stdout)
        .map_err(|e| EnvError::ListFailed { message: e.to_string() })?;
    let mut names: Vec<String> = value
        .get("envs")
        .and_then(|v| v.as_array())
        .map(|envs| {
            envs.iter()
                .filter_map(|p| p.as_str())
                .filter_map(|p| {
                    let path = std::path::Path::new(p);
                    let parent_is_envs = path
                        .parent()
                        .and_then(|d| d.file_name())
                        .is_some_and(|d| d == "envs");
                    if parent_is_envs {
                        path.file_name().map(|n| n.to_string_lossy().to_string())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    Ok(names)
}

/// Reject empty names and anything a shell could reinterpret.
fn validated(name: &str) -> Result<String, EnvError> {
    let trimmed = name.trim();
    let clean = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if clean {
        Ok(trimmed.to_string())
    } else {
        Err(EnvError::InvalidName { name: name.to_string() })
    }
}

/// Sink adapter that buffers stdout text for post-run parsing.
#[derive(Default, Clone)]
struct CollectedOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CollectedOutput {
    fn sink(&self) -> OnLine {
        let lines = Arc::clone(&self.lines);
        Arc::new(move |line: &Line| {
            if line.tag == berth_core::LineTag::Stdout {
                lines.lock().push(line.text.clone());
            }
        })
    }

    fn stdout(&self) -> String {
        self.lines.lock().join("\n")
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
