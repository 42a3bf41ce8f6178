//! Trace artifact naming and retention policy.
//!
//! Artifacts exist only to diagnose failures: an artifact is retained iff the
//! run failed and its trace flag is enabled. Everything else is discarded.

use crate::core::types::{RunStatus, TraceFlags};

/// The three independent trace producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Syscall log written by the tracer wrapper.
    CallTrace,
    /// Resource usage report.
    ResourceTrace,
    /// Captured stdout and stderr.
    OutputTrace,
}

/// Whether an artifact stays on disk after its run is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retained,
    Discarded,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::ResourceTrace,
        ArtifactKind::CallTrace,
        ArtifactKind::OutputTrace,
    ];

    /// Deterministic file name for this artifact, keyed by run index.
    ///
    /// Call traces are additionally keyed by the command tokens so that
    /// different commands traced into the same directory do not collide.
    pub fn file_name(self, index: u32, command: &[String]) -> String {
        match self {
            ArtifactKind::CallTrace => {
                format!("call_{}_{}.log", command_slug(command), index)
            }
            ArtifactKind::ResourceTrace => format!("sys_trace_{index}.log"),
            ArtifactKind::OutputTrace => format!("log_trace_run_{index}.log"),
        }
    }

    pub fn enabled(self, flags: &TraceFlags) -> bool {
        match self {
            ArtifactKind::CallTrace => flags.call_trace,
            ArtifactKind::ResourceTrace => flags.resource_trace,
            ArtifactKind::OutputTrace => flags.output_trace,
        }
    }
}

/// Decide the fate of an artifact once its run has been classified.
pub fn disposition(kind: ArtifactKind, status: RunStatus, flags: &TraceFlags) -> Disposition {
    if status.is_failure() && kind.enabled(flags) {
        Disposition::Retained
    } else {
        Disposition::Discarded
    }
}

/// Join command tokens with `_`, replacing path separators so the result
/// stays a single file name.
fn command_slug(command: &[String]) -> String {
    command
        .iter()
        .map(|token| token.replace(['/', '\\'], "_"))
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn all_flags() -> TraceFlags {
        TraceFlags {
            call_trace: true,
            resource_trace: true,
            output_trace: true,
        }
    }

    #[test]
    fn file_names_are_keyed_by_index() {
        let command = cmd(&["cat", "bla"]);
        assert_eq!(
            ArtifactKind::CallTrace.file_name(0, &command),
            "call_cat_bla_0.log"
        );
        assert_eq!(
            ArtifactKind::ResourceTrace.file_name(3, &command),
            "sys_trace_3.log"
        );
        assert_eq!(
            ArtifactKind::OutputTrace.file_name(7, &command),
            "log_trace_run_7.log"
        );
    }

    #[test]
    fn call_trace_name_keeps_flags_and_flattens_paths() {
        assert_eq!(
            ArtifactKind::CallTrace.file_name(1, &cmd(&["ls", "-l"])),
            "call_ls_-l_1.log"
        );
        assert_eq!(
            ArtifactKind::CallTrace.file_name(0, &cmd(&["/bin/cat", "a/b"])),
            "call__bin_cat_a_b_0.log"
        );
    }

    #[test]
    fn success_discards_everything_even_when_enabled() {
        for kind in ArtifactKind::ALL {
            assert_eq!(
                disposition(kind, RunStatus::Succeeded, &all_flags()),
                Disposition::Discarded
            );
        }
    }

    #[test]
    fn failure_retains_only_enabled_kinds() {
        let flags = TraceFlags {
            call_trace: false,
            resource_trace: true,
            output_trace: false,
        };
        assert_eq!(
            disposition(ArtifactKind::ResourceTrace, RunStatus::Failed, &flags),
            Disposition::Retained
        );
        assert_eq!(
            disposition(ArtifactKind::CallTrace, RunStatus::Failed, &flags),
            Disposition::Discarded
        );
        assert_eq!(
            disposition(ArtifactKind::OutputTrace, RunStatus::Failed, &flags),
            Disposition::Discarded
        );
    }

    #[test]
    fn failure_with_all_flags_retains_all() {
        for kind in ArtifactKind::ALL {
            assert_eq!(
                disposition(kind, RunStatus::Failed, &all_flags()),
                Disposition::Retained
            );
        }
    }
}
