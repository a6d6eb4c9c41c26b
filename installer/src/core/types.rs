//! Shared result and error types for the installation pipeline.

use thiserror::Error;

use crate::exit_codes;

/// Run configuration could not be resolved. Always raised before any step runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("unknown step '{slug}' in skip list")]
    UnknownSkip { slug: String },
    #[error("unknown step '{slug}' targeted by mode override")]
    UnknownOverride { slug: String },
    #[error("step '{slug}' is both skipped and targeted by a mode override")]
    OverrideOnSkippedStep { slug: String },
    #[error("invalid config {path}: {reason}")]
    ConfigFile { path: String, reason: String },
}

/// A step's action failed; the pipeline stops here.
#[derive(Debug, Error)]
#[error("step '{slug}' failed: {cause:#}")]
pub struct StepFailure {
    pub slug: String,
    pub cause: anyhow::Error,
}

/// Terminal state of one pipeline run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every effective step ran without error.
    Completed,
    Aborted(StepFailure),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Slug of the failing step, if any.
    pub fn failed_slug(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed => None,
            RunOutcome::Aborted(failure) => Some(failure.slug.as_str()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => exit_codes::OK,
            RunOutcome::Aborted(_) => exit_codes::ABORTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn step_failure_message_names_slug_and_cause() {
        let failure = StepFailure {
            slug: "registry-tweaks".to_string(),
            cause: anyhow!("access denied").context("run registry_tweaks.ps1"),
        };
        assert_eq!(
            failure.to_string(),
            "step 'registry-tweaks' failed: run registry_tweaks.ps1: access denied"
        );
    }

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(RunOutcome::Completed.exit_code(), exit_codes::OK);
        let aborted = RunOutcome::Aborted(StepFailure {
            slug: "b".to_string(),
            cause: anyhow!("boom"),
        });
        assert_eq!(aborted.exit_code(), exit_codes::ABORTED);
        assert_eq!(aborted.failed_slug(), Some("b"));
        assert!(!aborted.is_completed());
    }
}
