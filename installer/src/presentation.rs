//! Cooperative presentation loop for background runs.
//!
//! The loop owns the calling thread and the [`Surface`]. On its first idle
//! tick it dispatches the pipeline onto a worker thread; afterwards each tick
//! drains the status channel and renders what arrived. The worker never
//! touches the surface. When the worker hangs up the channel, the loop
//! renders the last messages, joins the worker and shuts the surface down,
//! whatever the outcome.

use std::io::Write;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Result, anyhow};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::types::{RunOutcome, StepFailure};
use crate::status::{StatusMessage, StatusReceiver};

/// Rendering fault. Never aborts the pipeline.
#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("render failed: {0}")]
    Render(#[from] std::io::Error),
}

/// Something that can display installation progress.
pub trait Surface {
    fn show(&mut self) -> Result<(), PresentationError>;
    fn set_status(&mut self, message: &StatusMessage) -> Result<(), PresentationError>;
    fn show_failure(&mut self, failure: &str) -> Result<(), PresentationError>;
    fn close(&mut self) -> Result<(), PresentationError>;
}

/// Plain-text overlay written to a terminal stream.
pub struct TerminalSurface<W: Write> {
    out: W,
    title: String,
    subtitle: String,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn show(&mut self) -> Result<(), PresentationError> {
        let rule = "=".repeat(self.title.len().max(self.subtitle.len()));
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "{}", self.title)?;
        writeln!(self.out, "{}", self.subtitle)?;
        writeln!(self.out, "{rule}")?;
        self.out.flush()?;
        Ok(())
    }

    fn set_status(&mut self, message: &StatusMessage) -> Result<(), PresentationError> {
        writeln!(self.out, "  > {message}")?;
        self.out.flush()?;
        Ok(())
    }

    fn show_failure(&mut self, failure: &str) -> Result<(), PresentationError> {
        writeln!(self.out, "  ! {failure}")?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PresentationError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Single-threaded loop that renders status until the pipeline finishes.
pub struct PresentationLoop<S: Surface> {
    surface: S,
    receiver: StatusReceiver,
    tick: Duration,
}

impl<S: Surface> PresentationLoop<S> {
    pub fn new(surface: S, receiver: StatusReceiver, tick: Duration) -> Self {
        Self {
            surface,
            receiver,
            tick,
        }
    }

    /// Run until the worker started by `dispatch` finishes; returns its outcome.
    ///
    /// `dispatch` is called once, on the first idle tick after the surface is
    /// shown. The worker must hold the only status sender so that its exit
    /// closes the channel.
    pub fn run<F>(mut self, dispatch: F) -> Result<RunOutcome>
    where
        F: FnOnce() -> Result<JoinHandle<RunOutcome>>,
    {
        if let Err(err) = self.surface.show() {
            warn!(err = %err, "failed to show presentation surface");
        }

        let mut dispatch = Some(dispatch);
        let mut worker = None;
        loop {
            if let Some(dispatch) = dispatch.take() {
                debug!("first idle tick, dispatching pipeline");
                match dispatch() {
                    Ok(handle) => worker = Some(handle),
                    Err(err) => {
                        self.close_surface();
                        return Err(err);
                    }
                }
                continue;
            }

            for message in self.receiver.drain_timeout(self.tick) {
                self.apply(&message);
            }
            if self.receiver.is_closed() {
                break;
            }
        }

        let outcome = match worker {
            Some(handle) => join_worker(handle),
            None => return Err(anyhow!("pipeline was never dispatched")),
        };

        if let RunOutcome::Aborted(failure) = &outcome {
            let line = failure.to_string();
            if let Err(err) = self.surface.show_failure(&line) {
                warn!(err = %err, "failed to render failure; falling back to stderr");
                eprintln!("{line}");
            }
        }
        self.close_surface();
        info!(completed = outcome.is_completed(), "presentation loop finished");
        Ok(outcome)
    }

    fn close_surface(&mut self) {
        if let Err(err) = self.surface.close() {
            warn!(err = %err, "failed to close presentation surface");
        }
    }

    fn apply(&mut self, message: &StatusMessage) {
        if let Err(err) = self.surface.set_status(message) {
            warn!(err = %err, "failed to render status; falling back to stderr");
            eprintln!("{message}");
        }
    }
}

fn join_worker(handle: JoinHandle<RunOutcome>) -> RunOutcome {
    match handle.join() {
        Ok(outcome) => outcome,
        Err(_) => RunOutcome::Aborted(StepFailure {
            slug: "<worker>".to_string(),
            cause: anyhow!("pipeline thread panicked"),
        }),
    }
}
