// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform descriptor computed once per process by the probe.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hosting environments the probe can identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Colab,
    VastAi,
    LightningAi,
    Kaggle,
    SageMaker,
    Localhost,
}

crate::simple_display! {
    Platform {
        Colab => "Google Colab",
        VastAi => "Vast.ai",
        LightningAi => "Lightning AI",
        Kaggle => "Kaggle",
        SageMaker => "AWS SageMaker",
        Localhost => "Localhost",
    }
}

/// GPU facts, when a GPU is visible at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuFacts {
    pub name: String,
    pub memory_total_mib: Option<u64>,
    pub memory_used_mib: Option<u64>,
    pub memory_free_mib: Option<u64>,
    pub driver_version: Option<String>,
}

/// Platform-specific behavior flags carried alongside the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformQuirks {
    /// Notebook host tag ("colab", "kaggle"), when the platform is one.
    pub notebook_environment: Option<String>,
    /// Provider sells GPU instances as the default shape.
    pub gpu_instance: bool,
    /// Platform cannot run the default isolation backend.
    pub requires_venv: bool,
}

/// Everything the rest of the system is allowed to know about where it
/// runs. Computed once; consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub platform: Platform,
    pub is_cloud: bool,
    pub supports_conda: bool,
    pub supports_venv: bool,
    pub base_path: PathBuf,
    pub memory_gb: Option<f64>,
    pub cpu_count: Option<usize>,
    pub gpu: Option<GpuFacts>,
    pub quirks: PlatformQuirks,
}

impl PlatformDescriptor {
    /// Descriptor for a plain local host rooted at `base_path`.
    pub fn localhost(base_path: impl Into<PathBuf>) -> Self {
        Self {
            platform: Platform::Localhost,
            is_cloud: false,
            supports_conda: true,
            supports_venv: true,
            base_path: base_path.into(),
            memory_gb: None,
            cpu_count: None,
            gpu: None,
            quirks: PlatformQuirks::default(),
        }
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
