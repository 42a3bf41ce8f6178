//! `runner`: execute a command repeatedly, tracing only the failures.
//!
//! Prints exactly two summary lines on stdout and exits `1` when failed runs
//! outnumber successful ones, `0` otherwise.

use anyhow::{Context, Result};
use runner::cli::{Cli, parse_args};
use runner::exit_codes;
use runner::io::config::{RunnerConfig, load_config};
use runner::io::executor::ProcessExecutor;
use runner::io::interrupt::install_interrupt_handler;
use runner::io::probe::SystemProbe;
use runner::logging;
use runner::looping::run_session;
use tokio_util::sync::CancellationToken;

fn main() {
    let args = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let cli = match parse_args(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let code = tracing::subscriber::with_default(logging::subscriber(cli.debug), || {
        match run(&cli) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{:#}", err);
                exit_codes::USAGE
            }
        }
    });
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => load_config(path).context("load config")?,
        None => RunnerConfig::default(),
    };
    let session = cli.session(&config);

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone())?;

    let outcome = run_session(
        &session,
        &ProcessExecutor,
        &SystemProbe::new(),
        &cancel,
        |_| {},
    );
    tracing::debug!(stop = ?outcome.stop, runs_started = outcome.runs_started, "session finished");

    for line in outcome.tally.summary_lines() {
        println!("{line}");
    }
    Ok(outcome.tally.exit_code())
}
