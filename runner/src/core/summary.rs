//! Aggregation of run outcomes into the final summary and exit status.

use crate::core::types::RunStatus;
use crate::exit_codes;

/// Success and failure counters for one session.
///
/// Counters only grow; they are updated once per classified invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: u32,
    pub failed: u32,
}

impl Tally {
    pub fn record(&mut self, status: RunStatus) {
        match status {
            RunStatus::Succeeded => self.succeeded += 1,
            RunStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.succeeded + self.failed
    }

    /// The two summary lines printed on stdout, without trailing newlines.
    pub fn summary_lines(&self) -> [String; 2] {
        [
            format!("Number of executions failed: {}", self.failed),
            format!("Number of executions succeeded: {}", self.succeeded),
        ]
    }

    /// `FAILURES_DOMINATE` when failures strictly outnumber successes, `OK` otherwise.
    ///
    /// Ties, including a session where nothing was classified, exit `OK`.
    pub fn exit_code(&self) -> i32 {
        if self.failed > self.succeeded {
            exit_codes::FAILURES_DOMINATE
        } else {
            exit_codes::OK
        }
    }
}
