//! Privilege precondition checked before anything else runs.

use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

pub trait PrivilegeCheck {
    fn ensure(&self) -> Result<()>;
}

/// Administrator check via `net session` on Windows, `id -u` elsewhere.
#[derive(Debug, Default)]
pub struct SystemPrivilegeCheck;

impl PrivilegeCheck for SystemPrivilegeCheck {
    #[cfg(windows)]
    fn ensure(&self) -> Result<()> {
        let output = Command::new("net")
            .arg("session")
            .output()
            .context("run net session")?;
        debug!(exit_code = ?output.status.code(), "net session finished");
        if !output.status.success() {
            return Err(anyhow!(
                "the installer must be run from an elevated (administrator) session"
            ));
        }
        Ok(())
    }

    #[cfg(not(windows))]
    fn ensure(&self) -> Result<()> {
        let output = Command::new("id")
            .arg("-u")
            .output()
            .context("run id -u")?;
        if !output.status.success() {
            return Err(anyhow!("id -u failed with status {:?}", output.status.code()));
        }
        let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(uid = %uid, "resolved effective uid");
        check_uid(&uid)
    }
}

#[cfg_attr(windows, allow(dead_code))]
fn check_uid(uid: &str) -> Result<()> {
    if uid != "0" {
        return Err(anyhow!(
            "the installer must be run as root (effective uid {uid})"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_uid_zero_passes() {
        assert!(check_uid("0").is_ok());
        let err = check_uid("1000").unwrap_err();
        assert!(err.to_string().contains("uid 1000"));
    }
}
