//! Test-only recording fakes for pipeline collaborators.
//!
//! Every fake appends to a shared [`CallLog`] so tests can assert on the
//! global order of status messages, step actions, reports and restarts.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use crate::core::registry::{Step, StepAction, StepRegistry};
use crate::io::reporter::ErrorReporter;
use crate::io::restart::RestartDirective;
use crate::presentation::{PresentationError, Surface};
use crate::status::{StatusMessage, StatusSink};

/// Shared, ordered record of calls. Cheap to clone; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("call log lock").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("call log lock").clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Action that logs `action:<slug>:<mode>`; it can fail with `<slug> exploded`
/// or panic with `<slug> blew up`.
pub struct RecordingAction {
    slug: String,
    behavior: Behavior,
    log: CallLog,
}

impl StepAction for RecordingAction {
    fn invoke(&self, mode: bool) -> Result<()> {
        self.log.push(format!("action:{}:{mode}", self.slug));
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(anyhow!("{} exploded", self.slug)),
            Behavior::Panic => panic!("{} blew up", self.slug),
        }
    }
}

fn registry_with(
    slugs: &[&str],
    log: &CallLog,
    behavior: impl Fn(&str) -> Behavior,
) -> StepRegistry {
    let steps = slugs
        .iter()
        .map(|slug| {
            let action: Arc<dyn StepAction> = Arc::new(RecordingAction {
                slug: slug.to_string(),
                behavior: behavior(slug),
                log: log.clone(),
            });
            Step::new(*slug, format!("Running {slug}..."), action)
        })
        .collect();
    StepRegistry::new(steps)
}

/// Registry of recording actions with messages `Running <slug>...`.
pub fn recording_registry(slugs: &[&str], failing: Option<&str>, log: &CallLog) -> StepRegistry {
    registry_with(slugs, log, |slug| {
        if failing == Some(slug) {
            Behavior::Fail
        } else {
            Behavior::Succeed
        }
    })
}

/// Like [`recording_registry`], but the `panicking` step panics instead of failing.
pub fn panicking_registry(slugs: &[&str], panicking: &str, log: &CallLog) -> StepRegistry {
    registry_with(slugs, log, |slug| {
        if slug == panicking {
            Behavior::Panic
        } else {
            Behavior::Succeed
        }
    })
}

/// Sink that logs `status:<message>`.
pub struct RecordingSink {
    log: CallLog,
}

impl RecordingSink {
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl StatusSink for RecordingSink {
    fn send(&self, message: StatusMessage) {
        self.log.push(format!("status:{message}"));
    }
}

/// Reporter that logs `report:<message>:<allow_continue>`.
pub struct RecordingReporter {
    log: CallLog,
}

impl RecordingReporter {
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, message: &str, allow_continue: bool) {
        self.log.push(format!("report:{message}:{allow_continue}"));
    }
}

/// Restart directive that logs `restart`.
pub struct RecordingRestart {
    log: CallLog,
    fail: bool,
}

impl RecordingRestart {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail: true,
        }
    }
}

impl RestartDirective for RecordingRestart {
    fn restart(&self) -> Result<()> {
        self.log.push("restart");
        if self.fail {
            return Err(anyhow!("shutdown not found"));
        }
        Ok(())
    }
}

/// Surface that logs `surface:<event>`; status renders can be made to fail.
pub struct RecordingSurface {
    log: CallLog,
    fail_renders: bool,
}

impl RecordingSurface {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_renders: false,
        }
    }

    pub fn broken(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_renders: true,
        }
    }
}

impl Surface for RecordingSurface {
    fn show(&mut self) -> Result<(), PresentationError> {
        self.log.push("surface:show");
        Ok(())
    }

    fn set_status(&mut self, message: &StatusMessage) -> Result<(), PresentationError> {
        if self.fail_renders {
            return Err(PresentationError::Render(std::io::Error::other(
                "display unavailable",
            )));
        }
        self.log.push(format!("surface:status:{message}"));
        Ok(())
    }

    fn show_failure(&mut self, failure: &str) -> Result<(), PresentationError> {
        self.log.push(format!("surface:failure:{failure}"));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PresentationError> {
        self.log.push("surface:close");
        Ok(())
    }
}

/// Write an executable-by-interpreter script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(name), body)?;
    Ok(())
}

/// Temporary installer workspace with `scripts/` and `logs/` directories.
pub struct ScratchDir {
    dir: tempfile::TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn scripts_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("scripts")
    }

    pub fn logs_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("logs")
    }
}
