//! Installer configuration stored in `installer.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::plan::RunOptions;
use crate::steps::KEEP_EDGE_TARGET;

/// Installer configuration (TOML).
///
/// Missing fields default to the values the shipped installer uses. Unknown
/// keys are rejected so a typo never silently changes what runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Directory holding the step scripts.
    pub scripts_dir: PathBuf,

    /// Interpreter command; the script path is appended as the last argument.
    pub interpreter: Vec<String>,

    /// Truncate captured script stdout/stderr beyond this many bytes.
    pub script_output_limit_bytes: usize,

    /// Directory for per-script logs and the run record.
    pub log_dir: PathBuf,

    pub presentation: PresentationConfig,

    pub run: RunDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationConfig {
    /// Status messages buffered before the pipeline thread waits for the display.
    pub status_capacity: usize,
    /// Presentation loop tick in milliseconds.
    pub tick_interval_ms: u64,
    pub title: String,
    pub subtitle: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            status_capacity: 64,
            tick_interval_ms: 50,
            title: "Talon Lite is installing".to_string(),
            subtitle: "Please don't use your keyboard or mouse. You can watch as Talon Lite works."
                .to_string(),
        }
    }
}

/// Run options that may be pinned in the config file instead of passed as flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunDefaults {
    pub skip: Vec<String>,
    pub keep_edge: bool,
    pub developer_mode: bool,
}

impl RunDefaults {
    pub fn to_options(&self) -> RunOptions {
        let mut mode_overrides = Vec::new();
        if self.keep_edge {
            mode_overrides.push(KEEP_EDGE_TARGET.to_string());
        }
        RunOptions {
            skip: self.skip.clone(),
            mode_overrides,
            developer_mode: self.developer_mode,
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("scripts"),
            interpreter: vec![
                "powershell".to_string(),
                "-NoProfile".to_string(),
                "-ExecutionPolicy".to_string(),
                "Bypass".to_string(),
                "-File".to_string(),
            ],
            script_output_limit_bytes: 100_000,
            log_dir: PathBuf::from("logs"),
            presentation: PresentationConfig::default(),
            run: RunDefaults::default(),
        }
    }
}

impl InstallerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interpreter.is_empty() || self.interpreter[0].trim().is_empty() {
            return Err(anyhow!("interpreter must be a non-empty array"));
        }
        if self.script_output_limit_bytes == 0 {
            return Err(anyhow!("script_output_limit_bytes must be > 0"));
        }
        if self.presentation.status_capacity == 0 {
            return Err(anyhow!("presentation.status_capacity must be > 0"));
        }
        if self.presentation.tick_interval_ms == 0 {
            return Err(anyhow!("presentation.tick_interval_ms must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `InstallerConfig::default()`.
pub fn load_config(path: &Path) -> Result<InstallerConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file missing, using defaults");
        let cfg = InstallerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: InstallerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
