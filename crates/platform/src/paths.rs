// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic directory layout rooted at the platform base path.

use berth_core::PlatformDescriptor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("failed to create directory {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolver for the per-installation directory layout:
///
/// ```text
/// <base>/apps/     per-app install directories
/// <base>/data/     shared persistent data
/// <base>/temp/     shared scratch
/// <base>/config/   state database and configuration
/// <base>/envs/     directory-based isolation environments
/// ```
///
/// Every accessor returns an existing directory, creating it on first
/// access with mode 0o755.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    pub fn new(descriptor: &PlatformDescriptor) -> Self {
        Self { base: descriptor.base_path.clone() }
    }

    /// Root the layout at an explicit base; used by tests and the CLI's
    /// `--base` override.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.clone())
    }

    pub fn apps(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.join("apps"))
    }

    pub fn data(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.join("data"))
    }

    pub fn temp(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.join("temp"))
    }

    pub fn config(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.join("config"))
    }

    pub fn envs(&self) -> Result<PathBuf, PathError> {
        ensure_dir(self.base.join("envs"))
    }

    /// The install directory owned by one app: `<base>/apps/<app_name>`.
    /// Not created here; ownership begins at install time.
    pub fn app_dir(&self, app_name: &str) -> Result<PathBuf, PathError> {
        Ok(self.apps()?.join(app_name))
    }
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, PathError> {
    if !path.is_dir() {
        std::fs::create_dir_all(&path)
            .map_err(|source| PathError::Create { path: path.clone(), source })?;
        set_permissions(&path);
    }
    Ok(path)
}

// Group/other get read+execute but not write.
#[cfg(unix)]
fn set_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755));
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path) {}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
