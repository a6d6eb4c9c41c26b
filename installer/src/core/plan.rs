//! Run configuration resolution and the effective step list.
//!
//! Resolution is pure: it takes raw options (already merged from the command
//! line and the config file) plus the registry, and either produces a
//! [`RunConfiguration`] or a [`ConfigurationError`]. The effective step list is
//! derived from it exactly once per run.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::core::registry::{StepAction, StepRegistry};
use crate::core::types::ConfigurationError;

/// Which thread runs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run on the calling thread with console status; no presentation surface.
    Foreground,
    /// Run on a worker thread while a presentation loop owns the calling thread.
    Background,
}

/// Unvalidated run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Slugs the user asked to skip.
    pub skip: Vec<String>,
    /// Slugs whose action receives `mode = true`.
    pub mode_overrides: Vec<String>,
    /// Run without the presentation overlay.
    pub developer_mode: bool,
}

impl RunOptions {
    /// Union of two option sets. Duplicates are harmless; resolution dedups.
    pub fn merge(mut self, other: RunOptions) -> RunOptions {
        self.skip.extend(other.skip);
        self.mode_overrides.extend(other.mode_overrides);
        self.developer_mode |= other.developer_mode;
        self
    }
}

/// Validated execution plan inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    pub skipped: BTreeSet<String>,
    pub mode_overrides: BTreeSet<String>,
    pub mode: ExecutionMode,
}

impl RunConfiguration {
    pub fn resolve(
        registry: &StepRegistry,
        options: &RunOptions,
    ) -> Result<Self, ConfigurationError> {
        let mut skipped = BTreeSet::new();
        for slug in &options.skip {
            if !registry.contains(slug) {
                return Err(ConfigurationError::UnknownSkip { slug: slug.clone() });
            }
            skipped.insert(slug.clone());
        }

        let mut mode_overrides = BTreeSet::new();
        for slug in &options.mode_overrides {
            if !registry.contains(slug) {
                return Err(ConfigurationError::UnknownOverride { slug: slug.clone() });
            }
            if skipped.contains(slug) {
                return Err(ConfigurationError::OverrideOnSkippedStep { slug: slug.clone() });
            }
            mode_overrides.insert(slug.clone());
        }

        let mode = if options.developer_mode {
            ExecutionMode::Foreground
        } else {
            ExecutionMode::Background
        };

        Ok(Self {
            skipped,
            mode_overrides,
            mode,
        })
    }

    pub fn is_skipped(&self, slug: &str) -> bool {
        self.skipped.contains(slug)
    }

    /// Mode flag passed to `slug`'s action.
    pub fn mode_for(&self, slug: &str) -> bool {
        self.mode_overrides.contains(slug)
    }

    /// Filter the registry by the skip set, keeping registry order.
    pub fn effective_steps(&self, registry: &StepRegistry) -> EffectiveStepList {
        let steps = registry
            .steps()
            .iter()
            .filter(|step| !self.is_skipped(&step.slug))
            .map(|step| PlannedStep {
                slug: step.slug.clone(),
                message: step.message.clone(),
                mode: self.mode_for(&step.slug),
                action: Arc::clone(&step.action),
            })
            .collect();
        EffectiveStepList { steps }
    }

    /// Skipped slugs in registry order.
    pub fn skipped_in_order<'a>(&self, registry: &'a StepRegistry) -> Vec<&'a str> {
        registry
            .slugs()
            .filter(|slug| self.is_skipped(slug))
            .collect()
    }
}

/// A step scheduled to run, with its resolved mode flag.
#[derive(Clone)]
pub struct PlannedStep {
    pub slug: String,
    pub message: String,
    pub mode: bool,
    pub action: Arc<dyn StepAction>,
}

impl fmt::Debug for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedStep")
            .field("slug", &self.slug)
            .field("message", &self.message)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// The registry after skips are applied. Fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct EffectiveStepList {
    steps: Vec<PlannedStep>,
}

impl EffectiveStepList {
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.slug.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::Step;
    use anyhow::Result;

    fn registry(slugs: &[&str]) -> StepRegistry {
        StepRegistry::new(
            slugs
                .iter()
                .map(|slug| {
                    let action: Arc<dyn StepAction> =
                        Arc::new(|_mode: bool| -> Result<()> { Ok(()) });
                    Step::new(*slug, format!("{slug} message"), action)
                })
                .collect(),
        )
    }

    fn skip(slugs: &[&str]) -> RunOptions {
        RunOptions {
            skip: slugs.iter().map(|s| s.to_string()).collect(),
            ..RunOptions::default()
        }
    }

    #[test]
    fn effective_steps_exclude_exactly_the_skip_set() {
        let registry = registry(&["a", "b", "c", "d"]);
        for skipped in [vec![], vec!["b"], vec!["a", "d"], vec!["d", "b", "a"]] {
            let config = RunConfiguration::resolve(&registry, &skip(&skipped)).expect("resolve");
            let effective: Vec<String> = config
                .effective_steps(&registry)
                .slugs()
                .map(str::to_string)
                .collect();
            let expected: Vec<String> = registry
                .slugs()
                .filter(|slug| !skipped.contains(slug))
                .map(str::to_string)
                .collect();
            assert_eq!(effective, expected, "skip set {skipped:?}");
        }
    }

    #[test]
    fn unknown_skip_is_a_configuration_error() {
        let registry = registry(&["a", "b"]);
        let err = RunConfiguration::resolve(&registry, &skip(&["a", "nope"])).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownSkip {
                slug: "nope".to_string()
            }
        );
    }

    #[test]
    fn override_retargets_mode_without_skipping() {
        let registry = registry(&["a", "b"]);
        let options = RunOptions {
            mode_overrides: vec!["a".to_string()],
            ..RunOptions::default()
        };
        let config = RunConfiguration::resolve(&registry, &options).expect("resolve");
        let steps = config.effective_steps(&registry);
        let modes: Vec<(&str, bool)> = steps
            .steps()
            .iter()
            .map(|s| (s.slug.as_str(), s.mode))
            .collect();
        assert_eq!(modes, vec![("a", true), ("b", false)]);
    }

    #[test]
    fn override_on_skipped_step_conflicts() {
        let registry = registry(&["a", "b"]);
        let options = RunOptions {
            skip: vec!["a".to_string()],
            mode_overrides: vec!["a".to_string()],
            developer_mode: false,
        };
        let err = RunConfiguration::resolve(&registry, &options).unwrap_err();
        assert!(matches!(err, ConfigurationError::OverrideOnSkippedStep { .. }));
    }

    #[test]
    fn override_on_unknown_step_is_rejected() {
        let registry = registry(&["a"]);
        let options = RunOptions {
            mode_overrides: vec!["zz".to_string()],
            ..RunOptions::default()
        };
        let err = RunConfiguration::resolve(&registry, &options).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownOverride { .. }));
    }

    #[test]
    fn developer_mode_selects_foreground() {
        let registry = registry(&["a"]);
        let background = RunConfiguration::resolve(&registry, &RunOptions::default())
            .expect("resolve");
        assert_eq!(background.mode, ExecutionMode::Background);

        let options = RunOptions {
            developer_mode: true,
            ..RunOptions::default()
        };
        let foreground = RunConfiguration::resolve(&registry, &options).expect("resolve");
        assert_eq!(foreground.mode, ExecutionMode::Foreground);
    }

    #[test]
    fn merge_unions_both_sources() {
        let merged = skip(&["a"]).merge(RunOptions {
            skip: vec!["b".to_string()],
            mode_overrides: vec!["c".to_string()],
            developer_mode: true,
        });
        assert_eq!(merged.skip, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(merged.mode_overrides, vec!["c".to_string()]);
        assert!(merged.developer_mode);
    }

    #[test]
    fn skipped_in_order_follows_registry() {
        let registry = registry(&["a", "b", "c"]);
        let config = RunConfiguration::resolve(&registry, &skip(&["c", "a"])).expect("resolve");
        assert_eq!(config.skipped_in_order(&registry), vec!["a", "c"]);
    }
}
