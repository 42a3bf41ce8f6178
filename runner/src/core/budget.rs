//! Failure budget countdown for the execution loop.

/// Countdown of failed invocations tolerated before the loop stops early.
///
/// An unlimited budget never exhausts, regardless of how many runs fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureBudget {
    remaining: Option<u32>,
}

impl FailureBudget {
    pub fn new(limit: Option<u32>) -> Self {
        Self { remaining: limit }
    }

    /// Record one failure. Returns `true` once the budget has reached zero.
    pub fn record_failure(&mut self) -> bool {
        match self.remaining.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        }
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}
