//! Script-backed step actions.
//!
//! A [`ScriptStep`] runs an ordered list of scripts through the configured
//! interpreter. Each script's output is written to its own log file under the
//! log directory; any spawn failure or non-zero exit fails the step.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::registry::StepAction;
use crate::io::config::InstallerConfig;
use crate::io::process::{CommandOutput, run_command};

/// One script in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSpec {
    /// File name relative to the scripts directory.
    pub name: &'static str,
    /// Not run when the step is invoked with `mode = true`.
    pub dropped_in_mode: bool,
}

impl ScriptSpec {
    pub const fn always(name: &'static str) -> Self {
        Self {
            name,
            dropped_in_mode: false,
        }
    }

    pub const fn unless_mode(name: &'static str) -> Self {
        Self {
            name,
            dropped_in_mode: true,
        }
    }
}

/// Runs scripts from a directory through an interpreter command.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    pub scripts_dir: PathBuf,
    pub interpreter: Vec<String>,
    pub log_dir: PathBuf,
    pub output_limit_bytes: usize,
}

impl ScriptRunner {
    pub fn from_config(cfg: &InstallerConfig) -> Self {
        Self {
            scripts_dir: cfg.scripts_dir.clone(),
            interpreter: cfg.interpreter.clone(),
            log_dir: cfg.log_dir.clone(),
            output_limit_bytes: cfg.script_output_limit_bytes,
        }
    }

    /// Run one script to completion. Blocks for as long as the script runs.
    #[instrument(skip(self), fields(scripts_dir = %self.scripts_dir.display()))]
    pub fn run(&self, script: &str) -> Result<()> {
        let path = self.scripts_dir.join(script);
        if !path.exists() {
            return Err(anyhow!("missing script {}", path.display()));
        }
        let (program, args) = self
            .interpreter
            .split_first()
            .ok_or_else(|| anyhow!("interpreter must be a non-empty array"))?;

        info!(script, "executing script");
        let mut cmd = Command::new(program);
        cmd.args(args).arg(&path);
        let output = run_command(cmd, self.output_limit_bytes)
            .with_context(|| format!("run {script}"))?;

        let log_path = self.log_dir.join(format!("{script}.log"));
        if let Err(err) = write_script_log(&log_path, &output) {
            warn!(err = %format!("{err:#}"), "failed to write script log");
        }

        if !output.status.success() {
            warn!(script, exit_code = ?output.status.code(), "script failed");
            return Err(anyhow!(
                "{script} failed with status {:?}{}",
                output.status.code(),
                stderr_excerpt(&output)
            ));
        }

        info!(script, "script executed successfully");
        Ok(())
    }
}

/// Step action backed by a fixed list of scripts.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    scripts: Vec<ScriptSpec>,
    runner: Arc<ScriptRunner>,
}

impl ScriptStep {
    pub fn new(scripts: &[ScriptSpec], runner: Arc<ScriptRunner>) -> Self {
        Self {
            scripts: scripts.to_vec(),
            runner,
        }
    }

    /// Script names that run for the given mode flag, in order.
    pub fn scripts_for(&self, mode: bool) -> Vec<&'static str> {
        self.scripts
            .iter()
            .filter(|spec| !(mode && spec.dropped_in_mode))
            .map(|spec| spec.name)
            .collect()
    }
}

impl StepAction for ScriptStep {
    fn invoke(&self, mode: bool) -> Result<()> {
        for script in self.scripts_for(mode) {
            self.runner.run(script)?;
        }
        debug!(mode, "all scripts executed");
        Ok(())
    }
}

fn stderr_excerpt(output: &CommandOutput) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let excerpt: String = trimmed.chars().take(500).collect();
    format!(": {excerpt}")
}

fn write_script_log(path: &Path, output: &CommandOutput) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create script log dir {}", parent.display()))?;
    }
    let mut buf = String::new();
    buf.push_str("=== stdout ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stdout));
    buf.push_str(&output.stdout_truncated_notice("script"));
    buf.push_str("\n=== stderr ===\n");
    buf.push_str(&String::from_utf8_lossy(&output.stderr));
    buf.push_str(&output.stderr_truncated_notice("script"));
    buf.push_str(&format!("\n=== exit: {:?} ===\n", output.status.code()));
    fs::write(path, buf).with_context(|| format!("write script log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAVEN: &[ScriptSpec] = &[
        ScriptSpec::unless_mode("edge_vanisher.ps1"),
        ScriptSpec::always("cleanup.ps1"),
    ];

    fn runner(root: &Path) -> Arc<ScriptRunner> {
        Arc::new(ScriptRunner {
            scripts_dir: root.join("scripts"),
            interpreter: vec!["sh".to_string()],
            log_dir: root.join("logs"),
            output_limit_bytes: 10_000,
        })
    }

    #[test]
    fn mode_flag_drops_marked_scripts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let step = ScriptStep::new(RAVEN, runner(temp.path()));
        assert_eq!(
            step.scripts_for(false),
            vec!["edge_vanisher.ps1", "cleanup.ps1"]
        );
        assert_eq!(step.scripts_for(true), vec!["cleanup.ps1"]);
    }

    #[test]
    fn missing_script_fails_the_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let step = ScriptStep::new(RAVEN, runner(temp.path()));
        let err = step.invoke(false).unwrap_err();
        assert!(err.to_string().contains("missing script"));
    }

    #[cfg(unix)]
    #[test]
    fn runs_scripts_in_order_and_writes_logs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripts = temp.path().join("scripts");
        fs::create_dir_all(&scripts).expect("mkdir");
        let trace = temp.path().join("trace.txt");
        for name in ["edge_vanisher.ps1", "cleanup.ps1"] {
            fs::write(
                scripts.join(name),
                format!("echo {name} >> '{}'\necho ran {name}\n", trace.display()),
            )
            .expect("write script");
        }

        let step = ScriptStep::new(RAVEN, runner(temp.path()));
        step.invoke(false).expect("invoke");

        let ran = fs::read_to_string(&trace).expect("trace");
        assert_eq!(ran, "edge_vanisher.ps1\ncleanup.ps1\n");
        let log = fs::read_to_string(temp.path().join("logs/cleanup.ps1.log")).expect("log");
        assert!(log.contains("ran cleanup.ps1"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_stops_the_step() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripts = temp.path().join("scripts");
        fs::create_dir_all(&scripts).expect("mkdir");
        fs::write(scripts.join("edge_vanisher.ps1"), "echo denied >&2\nexit 5\n")
            .expect("write script");
        fs::write(scripts.join("cleanup.ps1"), "exit 0\n").expect("write script");

        let step = ScriptStep::new(RAVEN, runner(temp.path()));
        let err = step.invoke(false).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("edge_vanisher.ps1 failed with status Some(5)"));
        assert!(msg.contains("denied"));
        assert!(!temp.path().join("logs/cleanup.ps1.log").exists());
    }
}
