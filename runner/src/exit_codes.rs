//! Stable exit codes for the runner CLI.

/// Failures did not outnumber successes (ties included).
pub const OK: i32 = 0;
/// More invocations failed than succeeded.
pub const FAILURES_DOMINATE: i32 = 1;
/// Invalid arguments or configuration; no invocation was started.
pub const USAGE: i32 = 2;
