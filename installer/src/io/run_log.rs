//! Post-run record written to `<log_dir>/run.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::core::plan::EffectiveStepList;
use crate::core::types::RunOutcome;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordedOutcome {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunRecord {
    pub outcome: RecordedOutcome,
    /// Steps whose action was invoked, in order (including the failing one).
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed_step: Option<String>,
    pub cause: Option<String>,
    pub duration_ms: u64,
}

impl RunRecord {
    pub fn new(
        steps: &EffectiveStepList,
        skipped: &[&str],
        outcome: &RunOutcome,
        duration_ms: u64,
    ) -> Self {
        let executed: Vec<String> = match outcome {
            RunOutcome::Completed => steps.slugs().map(str::to_string).collect(),
            RunOutcome::Aborted(failure) => {
                let mut executed = Vec::new();
                for slug in steps.slugs() {
                    executed.push(slug.to_string());
                    if slug == failure.slug {
                        break;
                    }
                }
                executed
            }
        };
        let (recorded, failed_step, cause) = match outcome {
            RunOutcome::Completed => (RecordedOutcome::Completed, None, None),
            RunOutcome::Aborted(failure) => (
                RecordedOutcome::Aborted,
                Some(failure.slug.clone()),
                Some(format!("{:#}", failure.cause)),
            ),
        };
        Self {
            outcome: recorded,
            executed,
            skipped: skipped.iter().map(|s| s.to_string()).collect(),
            failed_step,
            cause,
            duration_ms,
        }
    }
}

/// Atomically write the run record (temp file + rename). Returns its path.
pub fn write_run_record(log_dir: &Path, record: &RunRecord) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("create log dir {}", log_dir.display()))?;
    let path = log_dir.join("run.json");
    let tmp_path = path.with_extension("json.tmp");
    let mut buf = serde_json::to_string_pretty(record).context("serialize run record")?;
    buf.push('\n');
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp run record {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("replace run record {}", path.display()))?;
    debug!(path = %path.display(), "run record written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::{RunConfiguration, RunOptions};
    use crate::core::registry::{Step, StepAction, StepRegistry};
    use crate::core::types::StepFailure;
    use anyhow::anyhow;
    use std::sync::Arc;

    fn steps(slugs: &[&str]) -> EffectiveStepList {
        let registry = StepRegistry::new(
            slugs
                .iter()
                .map(|slug| {
                    let action: Arc<dyn StepAction> =
                        Arc::new(|_mode: bool| -> anyhow::Result<()> { Ok(()) });
                    Step::new(*slug, "msg", action)
                })
                .collect(),
        );
        RunConfiguration::resolve(&registry, &RunOptions::default())
            .expect("resolve")
            .effective_steps(&registry)
    }

    #[test]
    fn aborted_record_stops_at_failing_step() {
        let outcome = RunOutcome::Aborted(StepFailure {
            slug: "b".to_string(),
            cause: anyhow!("exit 1"),
        });
        let record = RunRecord::new(&steps(&["a", "b", "c"]), &["z"], &outcome, 12);
        assert_eq!(record.outcome, RecordedOutcome::Aborted);
        assert_eq!(record.executed, vec!["a", "b"]);
        assert_eq!(record.skipped, vec!["z"]);
        assert_eq!(record.failed_step.as_deref(), Some("b"));
        assert_eq!(record.cause.as_deref(), Some("exit 1"));
    }

    #[test]
    fn writes_json_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let record = RunRecord::new(&steps(&["a"]), &[], &RunOutcome::Completed, 5);
        let path = write_run_record(&temp.path().join("logs"), &record).expect("write");
        let raw = fs::read_to_string(path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["outcome"], "completed");
        assert_eq!(value["executed"][0], "a");
        assert!(value["failed_step"].is_null());
    }
}
