//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

/// Wait for a termination signal (SIGTERM, SIGINT, or SIGHUP) and
/// report which one arrived.
pub async fn wait_for_shutdown() {
    let mut sigterm = register(SignalKind::terminate());
    let mut sigint = register(SignalKind::interrupt());
    let mut sighup = register(SignalKind::hangup());

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
        _ = sighup.recv() => "SIGHUP",
    };
    info!(signal = name, "termination signal received");
}

fn register(kind: SignalKind) -> Signal {
    signal(kind).expect("failed to register signal handler")
}
