//! Wiring from parsed input to a finished run.
//!
//! [`plan_run`] performs every fallible configuration step up front so that a
//! [`ConfigurationError`] is always raised before any step runs. [`launch`]
//! then executes the plan in its mode and records the result.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

use crate::core::plan::{EffectiveStepList, ExecutionMode, RunConfiguration, RunOptions};
use crate::core::registry::StepRegistry;
use crate::core::types::{ConfigurationError, RunOutcome};
use crate::io::config::{InstallerConfig, load_config};
use crate::io::reporter::ErrorReporter;
use crate::io::restart::RestartDirective;
use crate::io::run_log::{RunRecord, write_run_record};
use crate::io::scripts::ScriptRunner;
use crate::mode::{LoopSettings, execute};
use crate::presentation::Surface;
use crate::steps::default_registry;

/// Everything needed to start a run, already validated.
#[derive(Debug)]
pub struct RunPlan {
    pub config: InstallerConfig,
    pub mode: ExecutionMode,
    pub steps: EffectiveStepList,
    /// Skipped slugs in registry order.
    pub skipped: Vec<String>,
}

impl RunPlan {
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            status_capacity: self.config.presentation.status_capacity,
            tick: Duration::from_millis(self.config.presentation.tick_interval_ms),
        }
    }
}

/// Load config, merge it with `cli_options`, and resolve against the shipped catalog.
pub fn plan_run(
    config_path: &Path,
    cli_options: RunOptions,
) -> Result<RunPlan, ConfigurationError> {
    let config = load_config(config_path).map_err(|err| ConfigurationError::ConfigFile {
        path: config_path.display().to_string(),
        reason: format!("{err:#}"),
    })?;
    let registry = default_registry(Arc::new(ScriptRunner::from_config(&config)));
    let options = config.run.to_options().merge(cli_options);
    plan_with_registry(config, &registry, &options)
}

/// Resolve `options` against an explicit registry.
pub fn plan_with_registry(
    config: InstallerConfig,
    registry: &StepRegistry,
    options: &RunOptions,
) -> Result<RunPlan, ConfigurationError> {
    let run = RunConfiguration::resolve(registry, options)?;
    let skipped: Vec<String> = run
        .skipped_in_order(registry)
        .into_iter()
        .map(str::to_string)
        .collect();
    for slug in &skipped {
        info!(slug = %slug, "skipping step");
    }
    for slug in &run.mode_overrides {
        info!(slug = %slug, "alternate mode requested");
    }
    Ok(RunPlan {
        mode: run.mode,
        steps: run.effective_steps(registry),
        skipped,
        config,
    })
}

/// Execute `plan` and return the pipeline outcome.
///
/// The run record is written as soon as the outcome is known, before the
/// restart request; a failed write is logged and never changes the outcome.
pub fn launch<R, D, S, F>(
    plan: RunPlan,
    reporter: R,
    restart: D,
    make_surface: F,
) -> Result<RunOutcome>
where
    R: ErrorReporter + Send + 'static,
    D: RestartDirective + Send + 'static,
    S: Surface,
    F: FnOnce() -> S,
{
    let started = Instant::now();
    let settings = plan.loop_settings();
    let RunPlan {
        config,
        mode,
        steps,
        skipped,
    } = plan;

    let recorded_steps = steps.clone();
    let record_run = move |outcome: &RunOutcome| {
        let skipped: Vec<&str> = skipped.iter().map(String::as_str).collect();
        let record = RunRecord::new(
            &recorded_steps,
            &skipped,
            outcome,
            started.elapsed().as_millis() as u64,
        );
        match write_run_record(&config.log_dir, &record) {
            Ok(path) => info!(path = %path.display(), "run record written"),
            Err(err) => warn!(err = %format!("{err:#}"), "failed to write run record"),
        }
    };

    execute(
        mode,
        steps,
        reporter,
        restart,
        record_run,
        settings,
        make_surface,
    )
}
