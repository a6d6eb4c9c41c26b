//! Unattended installer that applies a fixed, ordered sequence of system
//! modifications while reporting progress.
//!
//! The crate separates concerns the same way throughout:
//!
//! - **[`core`]**: Pure, deterministic logic (step registry, run configuration
//!   resolution, outcomes). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (scripts, config file, privilege
//!   check, restart, error reporting, run record).
//!
//! Orchestration modules ([`orchestrator`], [`status`], [`presentation`],
//! [`mode`], [`launch`]) coordinate core logic with I/O to implement the
//! `installer` binary.

pub mod cli;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod launch;
pub mod logging;
pub mod mode;
pub mod orchestrator;
pub mod presentation;
pub mod status;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
