//! The shipped step catalog.

use std::sync::Arc;

use crate::core::registry::{Step, StepAction, StepRegistry};
use crate::io::scripts::{ScriptRunner, ScriptSpec, ScriptStep};

/// Step whose mode flag `--keep-edge` sets.
pub const KEEP_EDGE_TARGET: &str = "execute-raven-scripts";

/// Static description of one shipped step.
#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub slug: &'static str,
    pub message: &'static str,
    pub scripts: &'static [ScriptSpec],
}

pub const STEP_DEFS: &[StepDef] = &[
    StepDef {
        slug: "execute-raven-scripts",
        message: "Executing debloating scripts...",
        scripts: &[ScriptSpec::unless_mode("edge_vanisher.ps1")],
    },
    StepDef {
        slug: "execute-external-scripts",
        message: "Debloating Windows...",
        scripts: &[ScriptSpec::always("external_debloat.ps1")],
    },
    StepDef {
        slug: "registry-tweaks",
        message: "Making some visual tweaks...",
        scripts: &[ScriptSpec::always("registry_tweaks.ps1")],
    },
    StepDef {
        slug: "configure-updates",
        message: "Configuring Windows Update policies...",
        scripts: &[ScriptSpec::always("configure_updates.ps1")],
    },
];

pub fn slugs() -> Vec<&'static str> {
    STEP_DEFS.iter().map(|def| def.slug).collect()
}

/// Build the registry with every step backed by `runner`.
pub fn default_registry(runner: Arc<ScriptRunner>) -> StepRegistry {
    let steps = STEP_DEFS
        .iter()
        .map(|def| {
            let action: Arc<dyn StepAction> =
                Arc::new(ScriptStep::new(def.scripts, Arc::clone(&runner)));
            Step::new(def.slug, def.message, action)
        })
        .collect();
    StepRegistry::new(steps)
}
