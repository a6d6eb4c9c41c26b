//! Execution mode switch: foreground (diagnostic) or background (with overlay).

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::plan::{EffectiveStepList, ExecutionMode};
use crate::core::types::RunOutcome;
use crate::io::reporter::ErrorReporter;
use crate::io::restart::RestartDirective;
use crate::orchestrator::run_pipeline;
use crate::presentation::{PresentationLoop, Surface};
use crate::status::{self, ConsoleSink};

/// Channel and loop settings for background mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub status_capacity: usize,
    pub tick: Duration,
}

/// Run the pipeline in the chosen mode and return once it is over.
///
/// Foreground mode runs on the calling thread with console status and never
/// calls `make_surface`. Background mode builds the surface, hands the calling
/// thread to the presentation loop and runs the pipeline on a worker thread;
/// this returns only after the loop has shut down. `on_finish` is handed to
/// [`run_pipeline`] and runs on whichever thread executes the steps.
pub fn execute<R, D, W, S, F>(
    mode: ExecutionMode,
    steps: EffectiveStepList,
    reporter: R,
    restart: D,
    on_finish: W,
    settings: LoopSettings,
    make_surface: F,
) -> Result<RunOutcome>
where
    R: ErrorReporter + Send + 'static,
    D: RestartDirective + Send + 'static,
    W: FnOnce(&RunOutcome) + Send + 'static,
    S: Surface,
    F: FnOnce() -> S,
{
    match mode {
        ExecutionMode::Foreground => {
            info!("running in foreground mode");
            Ok(run_pipeline(
                &steps,
                &ConsoleSink,
                &reporter,
                &restart,
                on_finish,
            ))
        }
        ExecutionMode::Background => {
            info!("running in background mode");
            let (sender, receiver) = status::channel(settings.status_capacity);
            let surface = make_surface();
            let presentation = PresentationLoop::new(surface, receiver, settings.tick);
            presentation.run(move || {
                debug!("spawning pipeline worker");
                thread::Builder::new()
                    .name("installer-pipeline".to_string())
                    .spawn(move || run_pipeline(&steps, &sender, &reporter, &restart, on_finish))
                    .context("spawn pipeline worker")
            })
        }
    }
}
