//! Deterministic, pure logic shared by the execution loop.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod artifacts;
pub mod budget;
pub mod classifier;
pub mod command;
pub mod procfs;
pub mod report;
pub mod summary;
pub mod types;
