//! Station-mode network links.

use std::process::{Command, Output};

use sweep_traits::NetworkLink;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to run nmcli: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("nmcli exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

fn check(out: Output) -> Result<String, LinkError> {
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    } else {
        Err(LinkError::Failed {
            status: out.status.to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}

/// `nmcli -t -f STATE general` prints e.g. `connected` or `connecting`.
pub fn is_connected_state(stdout: &str) -> bool {
    stdout
        .lines()
        .next()
        .map(str::trim)
        .is_some_and(|s| s == "connected" || s == "connected (site only)")
}

/// Joins Wi-Fi through NetworkManager.
pub struct NmcliLink {
    program: String,
}

impl Default for NmcliLink {
    fn default() -> Self {
        Self {
            program: "nmcli".to_string(),
        }
    }
}

impl NmcliLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<String, LinkError> {
        check(
            Command::new(&self.program)
                .args(["-t", "-f", "STATE", "general"])
                .output()?,
        )
    }
}

impl NetworkLink for NmcliLink {
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["device", "wifi", "connect", ssid]);
        if !password.is_empty() {
            cmd.args(["password", password]);
        }
        let out = check(cmd.output().map_err(LinkError::from)?)?;
        debug!(output = out.trim(), "nmcli connect");
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        match self.state() {
            Ok(s) => is_connected_state(&s),
            Err(e) => {
                warn!(error = %e, "nmcli state query failed");
                false
            }
        }
    }
}

/// The host is already online (Wi-Fi managed by the OS, wired, or simulation).
#[derive(Debug, Default, Clone, Copy)]
pub struct HostLink;

impl NetworkLink for HostLink {
    fn connect(&mut self, _ssid: &str, _password: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        true
    }
}
