//! Stable exit codes for the installer binary.

/// Every step ran and a restart was requested.
pub const OK: i32 = 0;
/// A step failed and the pipeline was aborted.
pub const ABORTED: i32 = 1;
/// Invalid command line or config file; no step ran.
pub const CONFIG: i32 = 2;
/// The process lacks the privileges required to modify the system.
pub const PRIVILEGE: i32 = 3;
