// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-install lifecycle: uninstall and per-app config.

use crate::report;
use crate::Deps;
use berth_core::{Clock, Line, OnLine};
use berth_envs::EnvBackend;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("app '{0}' not found in library")]
    NotFound(String),

    #[error("app '{app_name}' has no install path recorded")]
    NoInstallPath { app_name: String },

    #[error("config file for '{app_name}' is not valid json: {source}")]
    BadConfig {
        app_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fs(#[from] berth_fsops::FsError),

    #[error(transparent)]
    State(#[from] berth_storage::StateStoreError),
}

/// Uninstall and config management for installed apps.
pub struct LibraryOps<C: Clock> {
    deps: Arc<Deps<C>>,
}

impl<C: Clock> LibraryOps<C> {
    pub fn new(deps: Arc<Deps<C>>) -> Self {
        Self { deps }
    }

    /// Remove the app's environment, files, and record.
    ///
    /// Environment and file removal are best-effort: their failures are
    /// reported through the sink but never block removal of the state
    /// record, so a broken app can always be reinstalled. Returns true
    /// when the record is gone.
    pub fn uninstall(&self, app_name: &str, on_line: OnLine) -> bool {
        on_line(&Line::stdout(format!("uninstalling '{app_name}'")));

        let record = match self.deps.store.get(app_name) {
            Ok(Some(record)) => record,
            Ok(None) => {
                on_line(&Line::error(format!("app '{app_name}' not found in library")));
                return false;
            }
            Err(e) => {
                report::emit_failure(&on_line, "uninstall", app_name, &e);
                return false;
            }
        };

        // Environment teardown.
        let env_name = record.environment_name.clone().unwrap_or_else(|| app_name.to_string());
        match self.deps.envs.destroy(&env_name, Arc::clone(&on_line)) {
            Ok(()) => {
                on_line(&Line::stdout(format!("environment '{env_name}' removed")));
            }
            Err(e) => {
                report::emit_failure(&on_line, "environment removal", app_name, &e);
                on_line(&Line::error("continuing uninstall without the environment"));
            }
        }

        // Installation directory.
        match record.install_path {
            Some(ref install_path) => match berth_fsops::remove(install_path) {
                Ok(()) => {
                    on_line(&Line::stdout(format!(
                        "install directory {} removed",
                        install_path.display()
                    )));
                }
                Err(e) => {
                    report::emit_failure(&on_line, "file removal", app_name, &e);
                    on_line(&Line::error("continuing uninstall without the files"));
                }
            },
            None => {
                on_line(&Line::stdout("no install directory recorded, skipping"));
            }
        }

        // The record itself is the one step that must succeed.
        match self.deps.store.remove(app_name) {
            Ok(existed) => {
                if existed {
                    on_line(&Line::stdout(format!("'{app_name}' removed from library")));
                } else {
                    on_line(&Line::stdout(format!("'{app_name}' was already gone")));
                }
                tracing::info!(app = app_name, "uninstall complete");
                true
            }
            Err(e) => {
                report::emit_failure(&on_line, "uninstall", app_name, &e);
                false
            }
        }
    }

    /// Read `config.json` from the app's install directory; an absent
    /// file is an empty config.
    pub fn get_config(&self, app_name: &str) -> Result<serde_json::Value, LibraryError> {
        let record = self
            .deps
            .store
            .get(app_name)?
            .ok_or_else(|| LibraryError::NotFound(app_name.to_string()))?;
        let install_path = record
            .install_path
            .ok_or_else(|| LibraryError::NoInstallPath { app_name: app_name.to_string() })?;
        let config_file = install_path.join("config.json");
        if !config_file.is_file() {
            return Ok(serde_json::json!({}));
        }
        let content =
            std::fs::read_to_string(&config_file).map_err(|source| berth_fsops::FsError::Io {
                op: "read config",
                path: config_file,
                source,
            })?;
        serde_json::from_str(&content)
            .map_err(|source| LibraryError::BadConfig { app_name: app_name.to_string(), source })
    }

    /// Atomically write `config.json` and mirror it into the record.
    pub fn set_config(
        &self,
        app_name: &str,
        config: &serde_json::Value,
    ) -> Result<(), LibraryError> {
        let record = self
            .deps
            .store
            .get(app_name)?
            .ok_or_else(|| LibraryError::NotFound(app_name.to_string()))?;
        let install_path = record
            .install_path
            .ok_or_else(|| LibraryError::NoInstallPath { app_name: app_name.to_string() })?;

        let blob = serde_json::to_string_pretty(config)
            .map_err(|source| LibraryError::BadConfig { app_name: app_name.to_string(), source })?;
        berth_fsops::write(&install_path.join("config.json"), &blob)?;
        self.deps.store.set_config_blob(app_name, &blob)?;
        tracing::debug!(app = app_name, "config updated");
        Ok(())
    }

    /// Whether environment removal happens through the backend or plain
    /// directory removal; exposed for observability.
    pub fn env_backend(&self) -> EnvBackend {
        self.deps.envs.backend()
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
