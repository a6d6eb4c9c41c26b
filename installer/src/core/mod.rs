//! Deterministic, pure logic for the installation pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod plan;
pub mod registry;
pub mod types;
