//! Translate SIGINT/SIGTERM into a cancellation token.

use std::thread;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancel `token` on the first SIGINT or SIGTERM.
///
/// Signal handlers are registered before this returns, so an interrupt that
/// arrives right after startup is not lost. Waiting happens on a dedicated
/// thread driving a current-thread runtime; the listener carries the caller's
/// tracing dispatcher.
pub fn install_interrupt_handler(token: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .context("build signal runtime")?;

    let (mut interrupt, mut terminate) = {
        let _guard = runtime.enter();
        (
            signal(SignalKind::interrupt()).context("register SIGINT handler")?,
            signal(SignalKind::terminate()).context("register SIGTERM handler")?,
        )
    };

    let dispatch = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
    thread::Builder::new()
        .name("interrupt-listener".to_string())
        .spawn(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                let name = runtime.block_on(async {
                    tokio::select! {
                        _ = interrupt.recv() => "SIGINT",
                        _ = terminate.recv() => "SIGTERM",
                    }
                });
                warn!(signal = name, "interrupt received, stopping after the current run");
                token.cancel();
            });
        })
        .context("spawn interrupt listener")?;
    Ok(())
}
