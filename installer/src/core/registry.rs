//! Ordered, immutable catalog of installation steps.
//!
//! The registry is assembled once at process start and only read afterwards.
//! Slug uniqueness is guaranteed by construction of the catalog, not checked
//! at run time.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

/// Opaque handle to one system-modification action.
///
/// `mode` is the step's alternate-mode flag (e.g. "keep the default browser").
/// Implementations block until the action finishes.
pub trait StepAction: Send + Sync {
    fn invoke(&self, mode: bool) -> Result<()>;
}

impl<F> StepAction for F
where
    F: Fn(bool) -> Result<()> + Send + Sync,
{
    fn invoke(&self, mode: bool) -> Result<()> {
        self(mode)
    }
}

/// One registry entry.
#[derive(Clone)]
pub struct Step {
    /// Stable identifier, used for skip flags and logging.
    pub slug: String,
    /// Progress text shown while the step runs.
    pub message: String,
    pub action: Arc<dyn StepAction>,
}

impl Step {
    pub fn new(
        slug: impl Into<String>,
        message: impl Into<String>,
        action: Arc<dyn StepAction>,
    ) -> Self {
        Self {
            slug: slug.into(),
            message: message.into(),
            action,
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("slug", &self.slug)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<Step>,
}

impl StepRegistry {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, slug: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.slug == slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.get(slug).is_some()
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

    fn noop() -> Arc<dyn StepAction> {
        Arc::new(|_mode: bool| -> Result<()> { Ok(()) })
    }

    #[test]
    fn preserves_insertion_order() {
        let registry = StepRegistry::new(vec![
            Step::new("b", "B", noop()),
            Step::new("a", "A", noop()),
            Step::new("c", "C", noop()),
        ]);
        let slugs: Vec<&str> = registry.slugs().collect();
        assert_eq!(slugs, vec!["b", "a", "c"]);
    }

    #[test]
    fn lookup_by_slug() {
        let registry = StepRegistry::new(vec![Step::new("a", "Doing A...", noop())]);
        assert_eq!(registry.get("a").map(|s| s.message.as_str()), Some("Doing A..."));
        assert!(registry.get("missing").is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn closures_are_actions() {
        let action: Arc<dyn StepAction> = Arc::new(|mode: bool| -> Result<()> {
            if mode {
                anyhow::bail!("mode not supported");
            }
            Ok(())
        });
        assert!(action.invoke(false).is_ok());
        assert!(action.invoke(true).is_err());
    }
}
