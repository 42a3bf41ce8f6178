//! Repeatedly execute a command and keep diagnostics for the runs that fail.
//!
//! A session runs the target command up to N times, one run at a time. Each
//! run is classified by its exit code; failed runs may keep a syscall trace,
//! a resource usage report and their captured output, while successful runs
//! leave nothing behind. A failure budget can stop the session early, and an
//! interrupt stops it after the in-flight run. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (classification, budget,
//!   retention, report rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (child processes, `/proc` probes,
//!   artifact files, signals). Isolated behind traits to enable scripting in tests.
//!
//! [`looping`] coordinates core logic with I/O; [`cli`] turns argv into a
//! session.

pub mod cli;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
