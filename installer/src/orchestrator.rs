//! Sequential execution of the effective step list.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::{Result, anyhow};
use tracing::{error, info, instrument, warn};

use crate::core::plan::{EffectiveStepList, PlannedStep};
use crate::core::types::{RunOutcome, StepFailure};
use crate::io::reporter::ErrorReporter;
use crate::io::restart::RestartDirective;
use crate::status::{StatusMessage, StatusSink};

/// Status shown after the last step, just before the restart request.
pub const RESTARTING_MESSAGE: &str = "Restarting system...";

/// Run every effective step in order and restart the machine if all succeed.
///
/// Each step's message is sent to `sink` before its action runs. The first
/// failing or panicking step stops the pipeline: it is reported once through
/// `reporter` (never continuable) and no later step runs. `on_finish` sees the
/// outcome exactly once, before the restart request, so anything it persists
/// survives the reboot. The restart directive is invoked at most once, and
/// only after the last step succeeded.
#[instrument(skip_all, fields(steps = steps.len()))]
pub fn run_pipeline<S, R, D, W>(
    steps: &EffectiveStepList,
    sink: &S,
    reporter: &R,
    restart: &D,
    on_finish: W,
) -> RunOutcome
where
    S: StatusSink + ?Sized,
    R: ErrorReporter + ?Sized,
    D: RestartDirective + ?Sized,
    W: FnOnce(&RunOutcome),
{
    for step in steps.steps() {
        sink.send(StatusMessage::new(step.message.as_str()));
        info!(slug = %step.slug, mode = step.mode, "running step");

        if let Err(cause) = invoke_step(step) {
            let failure = StepFailure {
                slug: step.slug.clone(),
                cause,
            };
            error!(
                slug = %failure.slug,
                err = %format!("{:#}", failure.cause),
                "step failed, aborting"
            );
            reporter.report(&failure.to_string(), false);
            let outcome = RunOutcome::Aborted(failure);
            on_finish(&outcome);
            return outcome;
        }

        info!(slug = %step.slug, "step finished");
    }

    let outcome = RunOutcome::Completed;
    on_finish(&outcome);

    sink.send(StatusMessage::new(RESTARTING_MESSAGE));
    if let Err(err) = restart.restart() {
        // The run itself is complete; the user can restart by hand.
        warn!(err = %format!("{err:#}"), "restart request failed");
        let message = format!(
            "Installation finished but the restart could not be requested: {err:#}\n\
             Please restart the computer manually."
        );
        reporter.report(&message, false);
    }
    outcome
}

/// Invoke a step's action, turning a panic into an ordinary step error.
fn invoke_step(step: &PlannedStep) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(|| step.action.invoke(step.mode))) {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
