//! Side-effecting collaborators of the installation pipeline.

pub mod config;
pub mod privilege;
pub mod process;
pub mod reporter;
pub mod restart;
pub mod run_log;
pub mod scripts;
