//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;
use toolrelay_core::config::{ServerLaunch, SessionConfig};

pub const FAKE_SERVER: &str = env!("CARGO_BIN_EXE_fake-tool-server");

pub fn launch(mode: &str) -> ServerLaunch {
    ServerLaunch::new(FAKE_SERVER, vec![mode.to_string()]).with_name(format!("fake-{mode}"))
}

pub fn timing() -> SessionConfig {
    SessionConfig {
        handshake_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(2),
        shutdown_grace: Duration::from_millis(200),
    }
}

/// Whether a process with this pid still exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
