//! Diagnostic tracing for the runner.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: step-by-step diagnostics on stderr, enabled by
//!   `--debug` or `RUST_LOG`. Never part of the summary on stdout.
//!
//! - **Trace artifacts (`io/artifacts`)**: files kept for failed runs,
//!   unaffected by the log level.

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Build the subscriber for one session.
///
/// With `debug` set, everything at `debug` and above is shown. Otherwise the
/// filter comes from `RUST_LOG`, defaulting to `warn`. Output goes to stderr
/// in compact format. The caller decides how long it is in effect, e.g. with
/// [`tracing::subscriber::with_default`].
///
/// # Example
/// ```bash
/// RUST_LOG=runner=debug runner cat missing --log-trace
/// ```
pub fn subscriber(debug: bool) -> impl Subscriber + Send + Sync {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
}
