// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hosting-platform detection and resource assessment.

use berth_core::{GpuFacts, Platform, PlatformDescriptor, PlatformQuirks};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

/// Env-var signature checked for each provider, in priority order.
/// The first present variable wins; everything else is Localhost.
const SIGNATURES: &[(&str, Platform, &str)] = &[
    ("COLAB_GPU", Platform::Colab, "/content"),
    ("VAST_AI_INSTANCE_ID", Platform::VastAi, "/workspace"),
    ("LIGHTNING_APP_STATE_URL", Platform::LightningAi, "/teamspace/studios/this_studio"),
    ("KAGGLE_KERNEL_RUN_TYPE", Platform::Kaggle, "/kaggle/working"),
    ("AWS_SAGEMAKER_JUPYTER_KERNEL_IMAGE_NAME", Platform::SageMaker, "/home/ec2-user/SageMaker"),
];

/// Identify the runtime environment and assess its resources.
///
/// Pure inspection: no directories are created, no state is written.
/// Missing facts (RAM, GPU) come back as `None`; only a failure to
/// resolve the local working directory is fatal.
pub fn probe() -> Result<PlatformDescriptor, ProbeError> {
    let detected = SIGNATURES
        .iter()
        .find(|(var, _, _)| std::env::var_os(var).is_some());

    let (platform, is_cloud, base_path) = match detected {
        Some(&(_, platform, base)) => (platform, true, PathBuf::from(base)),
        None => {
            let cwd = std::env::current_dir().map_err(ProbeError::WorkingDir)?;
            (Platform::Localhost, false, cwd)
        }
    };

    let quirks = quirks_for(platform);
    let supports_conda = !quirks.requires_venv;

    let descriptor = PlatformDescriptor {
        platform,
        is_cloud,
        supports_conda,
        supports_venv: true,
        base_path,
        memory_gb: total_memory_gb(),
        cpu_count: Some(num_cpus::get()),
        gpu: detect_gpu(),
        quirks,
    };

    tracing::info!(
        platform = %descriptor.platform,
        is_cloud = descriptor.is_cloud,
        base_path = %descriptor.base_path.display(),
        gpu = descriptor.gpu.is_some(),
        "platform probe complete"
    );

    Ok(descriptor)
}

fn quirks_for(platform: Platform) -> PlatformQuirks {
    match platform {
        Platform::Colab => PlatformQuirks {
            notebook_environment: Some("colab".to_string()),
            ..PlatformQuirks::default()
        },
        Platform::Kaggle => PlatformQuirks {
            notebook_environment: Some("kaggle".to_string()),
            ..PlatformQuirks::default()
        },
        Platform::VastAi => PlatformQuirks { gpu_instance: true, ..PlatformQuirks::default() },
        Platform::LightningAi => {
            PlatformQuirks { requires_venv: true, ..PlatformQuirks::default() }
        }
        Platform::SageMaker | Platform::Localhost => PlatformQuirks::default(),
    }
}

/// Total RAM in GiB from /proc/meminfo; `None` where that isn't readable.
fn total_memory_gb() -> Option<f64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let kib: u64 = meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    Some((kib as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0)
}

/// GPU facts via nvidia-smi; `None` when the tool is absent or fails.
fn detect_gpu() -> Option<GpuFacts> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,memory.total,memory.used,memory.free,driver_version",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_gpu_csv(&stdout)
}

/// First row of nvidia-smi CSV output.
fn parse_gpu_csv(stdout: &str) -> Option<GpuFacts> {
    let row = stdout.lines().find(|l| !l.trim().is_empty())?;
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return None;
    }
    Some(GpuFacts {
        name: fields[0].to_string(),
        memory_total_mib: fields[1].parse().ok(),
        memory_used_mib: fields[2].parse().ok(),
        memory_free_mib: fields[3].parse().ok(),
        driver_version: fields.get(4).map(|s| s.to_string()),
    })
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
