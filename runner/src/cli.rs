//! Command-line model for `runner`.
//!
//! Runner flags may appear anywhere on the line, before or after the target
//! command. [`partition_args`] pulls them out and hands clap everything else as
//! the command, so `runner ls -l -c 5` runs `ls -l` five times.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::core::types::TraceFlags;
use crate::io::config::RunnerConfig;
use crate::looping::SessionConfig;

/// Flags that take a value in the next token.
const VALUE_FLAGS: &[&str] = &["-c", "--failed-count", "--config"];
/// Boolean runner flags.
const SWITCHES: &[&str] = &[
    "--sys-trace",
    "--call-trace",
    "--log-trace",
    "--debug",
    "--net-trace",
];
/// Recognized only before the first command token, so `runner ls --help` runs `ls --help`.
const LEADING_ONLY: &[&str] = &["-h", "--help", "-V", "--version"];

#[derive(Debug, Parser)]
#[command(
    name = "runner",
    version,
    about = "Run a command repeatedly and keep traces of the runs that fail"
)]
pub struct Cli {
    /// Number of times to run the command.
    #[arg(
        short = 'c',
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub count: u32,

    /// Number of failed runs allowed before giving up.
    #[arg(
        long = "failed-count",
        value_name = "K",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub failed_count: Option<u32>,

    /// For each failed run, write a report of system measurements.
    #[arg(long)]
    pub sys_trace: bool,

    /// For each failed run, keep a log of the system calls it made.
    #[arg(long)]
    pub call_trace: bool,

    /// For each failed run, keep the command's stdout and stderr.
    #[arg(long)]
    pub log_trace: bool,

    /// Log each step of the loop to stderr.
    #[arg(long)]
    pub debug: bool,

    /// Accepted for compatibility; packet capture is not produced.
    #[arg(long)]
    pub net_trace: bool,

    /// TOML file with artifact and tracer settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Cli {
    pub fn trace_flags(&self) -> TraceFlags {
        TraceFlags {
            call_trace: self.call_trace,
            resource_trace: self.sys_trace,
            output_trace: self.log_trace,
        }
    }

    /// Merge the parsed flags with file configuration into a session.
    pub fn session(&self, config: &RunnerConfig) -> SessionConfig {
        SessionConfig {
            command: self.command.clone(),
            repeat_count: self.count,
            failure_budget: self.failed_count,
            trace: self.trace_flags(),
            net_trace: self.net_trace,
            artifact_dir: config.artifact_dir.clone(),
            tracer: config.call_trace.prefix(),
            output_limit_bytes: config.output_limit_bytes,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Parse a full argv (binary name first).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(partition_args(args))
}

/// Reorder argv so runner flags come first and every other token follows a
/// `--` separator as the command, in its original order.
///
/// A literal `--` ends runner flag recognition; tokens after it belong to the
/// command verbatim.
pub fn partition_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    let mut iter = args.into_iter();
    let mut runner_args = vec![iter.next().unwrap_or_else(|| "runner".to_string())];
    let mut command = Vec::new();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            command.extend(iter.by_ref());
            break;
        }
        let token = arg.as_str();
        if SWITCHES.contains(&token) || (command.is_empty() && LEADING_ONLY.contains(&token)) {
            runner_args.push(arg);
        } else if VALUE_FLAGS.contains(&token) {
            runner_args.push(arg);
            if let Some(value) = iter.next() {
                runner_args.push(value);
            }
        } else if has_attached_value(token) {
            runner_args.push(arg);
        } else {
            command.push(arg);
        }
    }

    runner_args.push("--".to_string());
    runner_args.extend(command);
    runner_args
}

/// `-c5`, `-c=5`, `--failed-count=3`, `--config=path`.
fn has_attached_value(token: &str) -> bool {
    if token.starts_with("--failed-count=") || token.starts_with("--config=") {
        return true;
    }
    match token.strip_prefix("-c") {
        Some(rest) => {
            let rest = rest.strip_prefix('=').unwrap_or(rest);
            !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
