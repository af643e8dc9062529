// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for orchestration tests.

use crate::Deps;
use berth_core::{FakeClock, PlatformDescriptor};
use berth_envs::EnvProvisioner;
use berth_platform::PathResolver;
use berth_shell::ProcessEngine;
use berth_storage::StateStore;
use berth_tunnel::{FakeBroker, TunnelBroker};
use std::sync::Arc;

pub(crate) struct Fixture {
    pub tmp: tempfile::TempDir,
    pub deps: Arc<Deps<FakeClock>>,
    pub broker: Arc<FakeBroker>,
}

/// Workspace on a venv-backend platform. Environments are seeded as
/// directories so creation short-circuits to "already exists" and no
/// real interpreter is needed.
pub(crate) fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut descriptor = PlatformDescriptor::localhost(tmp.path());
    descriptor.supports_conda = false;

    let paths = PathResolver::new(&descriptor);
    let processes = Arc::new(ProcessEngine::new().expect("engine"));
    let envs = Arc::new(
        EnvProvisioner::new(&descriptor, paths.envs().expect("envs dir"), Arc::clone(&processes))
            .expect("provisioner"),
    );
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let store =
        Arc::new(StateStore::open(&paths.config().expect("config dir"), clock).expect("store"));
    let broker = Arc::new(FakeBroker::new());

    let deps = Arc::new(Deps {
        store,
        envs,
        processes,
        paths,
        broker: Arc::clone(&broker) as Arc<dyn TunnelBroker>,
    });
    Fixture { tmp, deps, broker }
}

pub(crate) fn seed_env(fixture: &Fixture, name: &str) {
    let bin = fixture.tmp.path().join("envs").join(name).join("bin");
    std::fs::create_dir_all(&bin).expect("env dir");
    std::fs::write(bin.join("activate"), "# activate\n").expect("activate");
}
