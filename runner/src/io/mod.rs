//! I/O helpers for the execution loop.

pub mod artifacts;
pub mod config;
pub mod executor;
pub mod interrupt;
pub mod probe;
pub mod process;
