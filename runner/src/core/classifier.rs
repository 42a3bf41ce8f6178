//! Deterministic classification of invocation exit codes.

use nix::sys::signal::Signal;

use crate::core::types::RunStatus;

/// Exit code recorded when the target program cannot be spawned at all.
///
/// Matches the shell convention for "command not found".
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Offset added to a signal number when a child is killed by that signal.
pub const SIGNAL_EXIT_OFFSET: i32 = 128;

/// Classify an exit code: `0` succeeds, anything else fails.
///
/// Signal terminations are folded into `128 + signal` before they reach here,
/// so they classify as failures too.
pub fn classify_exit_code(exit_code: i32) -> RunStatus {
    if exit_code == 0 {
        RunStatus::Succeeded
    } else {
        RunStatus::Failed
    }
}

/// Whether an exit code is the conventional result of SIGINT or SIGTERM.
///
/// A terminal Ctrl-C reaches the whole foreground process group, so such a
/// child may die before the session's own handler has observed the signal.
pub fn is_interrupt_exit(exit_code: i32) -> bool {
    [Signal::SIGINT, Signal::SIGTERM]
        .into_iter()
        .any(|signal| exit_code == SIGNAL_EXIT_OFFSET + signal as i32)
}

/// Fold a process exit into a single integer code.
///
/// `code` is the normal exit code if the process exited; `signal` is the
/// terminating signal otherwise.
pub fn exit_code_from_parts(code: Option<i32>, signal: Option<i32>) -> i32 {
    match (code, signal) {
        (Some(code), _) => code,
        (None, Some(signal)) => SIGNAL_EXIT_OFFSET + signal,
        (None, None) => SIGNAL_EXIT_OFFSET,
    }
}
