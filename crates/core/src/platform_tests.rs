// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn localhost_descriptor_defaults() {
    let desc = PlatformDescriptor::localhost("/tmp/work");
    assert_eq!(desc.platform, Platform::Localhost);
    assert!(!desc.is_cloud);
    assert!(desc.supports_conda);
    assert!(desc.supports_venv);
    assert_eq!(desc.base_path, PathBuf::from("/tmp/work"));
    assert!(desc.gpu.is_none());
    assert!(!desc.quirks.requires_venv);
}

#[test]
fn platform_display_names() {
    assert_eq!(Platform::Colab.to_string(), "Google Colab");
    assert_eq!(Platform::LightningAi.to_string(), "Lightning AI");
    assert_eq!(Platform::Localhost.to_string(), "Localhost");
}

#[test]
fn descriptor_serializes_round_trip() {
    let mut desc = PlatformDescriptor::localhost("/content");
    desc.platform = Platform::Colab;
    desc.is_cloud = true;
    desc.memory_gb = Some(12.7);
    desc.cpu_count = Some(2);
    desc.gpu = Some(GpuFacts {
        name: "Tesla T4".into(),
        memory_total_mib: Some(15360),
        memory_used_mib: Some(0),
        memory_free_mib: Some(15360),
        driver_version: Some("535.104.05".into()),
    });
    let json = serde_json::to_string(&desc).unwrap();
    let back: PlatformDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, desc);
}
