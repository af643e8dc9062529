// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared end-to-end fixture: a full stack on a venv-backend platform
//! with a fake tunnel broker.

use berth_core::{FakeClock, PlatformDescriptor};
use berth_engine::Deps;
use berth_envs::EnvProvisioner;
use berth_platform::PathResolver;
use berth_shell::ProcessEngine;
use berth_storage::StateStore;
use berth_tunnel::{FakeBroker, TunnelBroker};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Stack {
    pub tmp: tempfile::TempDir,
    pub deps: Arc<Deps<FakeClock>>,
    pub broker: Arc<FakeBroker>,
}

pub fn stack() -> Stack {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut descriptor = PlatformDescriptor::localhost(tmp.path());
    descriptor.supports_conda = false;

    let paths = PathResolver::new(&descriptor);
    let processes = Arc::new(ProcessEngine::new().expect("engine"));
    let envs = Arc::new(
        EnvProvisioner::new(&descriptor, paths.envs().expect("envs"), Arc::clone(&processes))
            .expect("provisioner"),
    );
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let store = Arc::new(
        StateStore::open(&paths.config().expect("config"), clock.clone()).expect("store"),
    );
    let broker = Arc::new(FakeBroker::new());

    let deps = Arc::new(Deps {
        store,
        envs,
        processes,
        paths,
        broker: Arc::clone(&broker) as Arc<dyn TunnelBroker>,
    });
    Stack { tmp, deps, broker }
}

/// Seed a directory-backed environment so creation is a no-op.
pub fn seed_env(stack: &Stack, name: &str) {
    let bin = stack.tmp.path().join("envs").join(name).join("bin");
    std::fs::create_dir_all(&bin).expect("env dir");
    std::fs::write(bin.join("activate"), "# activate\n").expect("activate");
}

pub fn write_file(stack: &Stack, name: &str, content: &str) -> PathBuf {
    let path = stack.tmp.path().join(name);
    std::fs::write(&path, content).expect("write file");
    path
}

pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    check()
}
