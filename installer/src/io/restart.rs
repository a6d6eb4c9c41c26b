//! Operating system restart request.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::info;

/// Final side effect of a successful run.
pub trait RestartDirective {
    /// Request a restart. Fire-and-forget: returns once the request is issued.
    fn restart(&self) -> Result<()>;
}

/// Spawns the platform `shutdown` command without waiting for it.
#[derive(Debug, Default)]
pub struct SystemRestart;

impl SystemRestart {
    pub fn command() -> Command {
        let mut cmd = Command::new("shutdown");
        if cfg!(windows) {
            cmd.args(["/r", "/t", "0"]);
        } else {
            cmd.args(["-r", "now"]);
        }
        cmd
    }
}

impl RestartDirective for SystemRestart {
    fn restart(&self) -> Result<()> {
        info!("requesting system restart");
        let mut cmd = Self::command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        // The child is intentionally not awaited.
        let _child = cmd.spawn().context("spawn shutdown")?;
        Ok(())
    }
}
