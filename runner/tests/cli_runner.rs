//! CLI tests for the `runner` binary.
//!
//! Spawns the binary inside a scratch directory and checks the summary on
//! stdout, the exit code and which artifact files are left behind.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use runner::exit_codes;

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runner"))
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("spawn runner")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn strace_available() -> bool {
    Command::new("strace")
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[test]
fn single_successful_run() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(temp.path(), &["ls"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout(&output),
        "Number of executions failed: 0\nNumber of executions succeeded: 1\n"
    );
}

#[test]
fn repeated_successful_runs_with_command_flags() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(temp.path(), &["ls", "-l", "-c", "5"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout(&output),
        "Number of executions failed: 0\nNumber of executions succeeded: 5\n"
    );
}

#[test]
fn unknown_program_counts_as_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(temp.path(), &["jsnwn-not-a-program"]);

    assert_eq!(output.status.code(), Some(exit_codes::FAILURES_DOMINATE));
    assert_eq!(
        stdout(&output),
        "Number of executions failed: 1\nNumber of executions succeeded: 0\n"
    );
}

#[test]
fn failure_budget_stops_early() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(
        temp.path(),
        &["cat", "nonexistent", "-c", "5", "--failed-count", "3"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::FAILURES_DOMINATE));
    assert_eq!(
        stdout(&output),
        "Number of executions failed: 3\nNumber of executions succeeded: 0\n"
    );
}

#[test]
fn sys_trace_written_only_for_failures() {
    let temp = tempfile::tempdir().expect("tempdir");

    run_in(temp.path(), &["ls", "-l", "--sys-trace"]);
    assert!(!temp.path().join("sys_trace_0.log").exists());

    run_in(temp.path(), &["cat", "bla", "--sys-trace"]);
    let report =
        std::fs::read_to_string(temp.path().join("sys_trace_0.log")).expect("sys trace");
    assert!(report.contains("disk_io:"));
    assert!(report.contains("memory percentage:"));
    assert!(report.contains("cpu percentage:"));
    assert!(report.contains("Packets received:"));
    assert!(report.contains("Packets sent:"));
}

#[test]
fn log_trace_written_only_for_failures() {
    let temp = tempfile::tempdir().expect("tempdir");

    run_in(temp.path(), &["ls", "-l", "--log-trace"]);
    assert!(!temp.path().join("log_trace_run_0.log").exists());

    run_in(
        temp.path(),
        &[
            "--log-trace",
            "--",
            "sh",
            "-c",
            "echo to-out; echo to-err >&2; exit 1",
        ],
    );
    let log = std::fs::read_to_string(temp.path().join("log_trace_run_0.log")).expect("log trace");
    assert_eq!(log, "to-out\n\nto-err\n");
}

#[test]
fn disabled_traces_write_nothing_for_failures() {
    let temp = tempfile::tempdir().expect("tempdir");
    run_in(temp.path(), &["cat", "bla", "-c", "2"]);

    let entries = std::fs::read_dir(temp.path()).expect("read dir").count();
    assert_eq!(entries, 0);
}

#[test]
fn call_trace_kept_for_failure_removed_for_success() {
    if !strace_available() {
        eprintln!("skipping: strace not installed");
        return;
    }
    let temp = tempfile::tempdir().expect("tempdir");

    run_in(temp.path(), &["ls", "-l", "--call-trace"]);
    assert!(!temp.path().join("call_ls_-l_0.log").exists());

    run_in(temp.path(), &["cat", "bla", "--call-trace"]);
    assert!(temp.path().join("call_cat_bla_0.log").is_file());
}

#[test]
fn debug_logs_loop_progress_on_stderr() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(temp.path(), &["cat", "bla", "--debug", "--sys-trace"]);

    assert_eq!(
        stdout(&output),
        "Number of executions failed: 1\nNumber of executions succeeded: 0\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in [
        "Start the execution",
        "Running the 1 command",
        "Running cat bla",
        "Execution return code: 1",
        "Saving sys trace log",
        "Finishing Execution 1",
    ] {
        assert!(stderr.contains(line), "missing {line:?} in {stderr}");
    }
}

#[test]
fn missing_command_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = run_in(temp.path(), &[]);

    assert_eq!(output.status.code(), Some(exit_codes::USAGE));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_config_file_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("bad.toml"), "output_limit_bytes = 0\n").expect("write");
    let output = run_in(temp.path(), &["ls", "--config", "bad.toml"]);

    assert_eq!(output.status.code(), Some(exit_codes::USAGE));
    assert!(String::from_utf8_lossy(&output.stderr).contains("output_limit_bytes"));
}

#[test]
fn config_artifact_dir_receives_traces() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("runner.toml"), "artifact_dir = \"traces\"\n").expect("write");
    run_in(
        temp.path(),
        &["--config", "runner.toml", "cat", "bla", "--log-trace"],
    );

    assert!(temp.path().join("traces/log_trace_run_0.log").is_file());
}

#[test]
fn missing_tracer_is_reported_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        temp.path().join("runner.toml"),
        "[call_trace]\ntracer = [\"definitely-missing-tracer-xyz\"]\n",
    )
    .expect("write");
    let output = run_in(
        temp.path(),
        &["--config", "runner.toml", "ls", "-c", "3", "--call-trace"],
    );

    assert_eq!(
        stdout(&output),
        "Number of executions failed: 3\nNumber of executions succeeded: 0\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("call tracer unavailable").count(), 1, "{stderr}");
    assert!(stderr.contains("definitely-missing-tracer-xyz"));
}
