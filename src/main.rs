//! voicenav-daemon: background daemon for a voice-driven page-control agent
//!
//! The daemon turns recognized speech into page actions and speaks
//! feedback through a synthesized voice channel:
//! - continuous recognition with a self-healing session restart loop
//! - half-duplex arbitration between recognition and synthesis
//! - substring command table plus a yes/no confirmation dialogue
//! - IPC for start/stop/toggle/status/log and pushed notifications
//!
//! Speech engines and the page are trait seams; this binary wires the
//! console adapters and an HTML snapshot page.

mod commands;
mod config;
mod controller;
mod dialogue;
mod events;
mod ipc;
mod lifecycle;
mod page;
mod speech;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::controller::{ControlEvent, Controller};
use crate::events::RelayEvent;
use crate::ipc::Server;
use crate::lifecycle::wait_for_shutdown;
use crate::page::HtmlPage;
use crate::speech::{ConsoleInput, ConsoleOutput, EngineEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voicenav-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config
        .ensure_dirs()
        .context("failed to create data directory")?;
    info!(?config.socket_path, "configuration loaded");

    // Engine signals and UI requests funnel into one controller channel
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControlEvent>();
    // Controller -> subscribed IPC clients
    let (relay_tx, _relay_rx) = broadcast::channel::<RelayEvent>(64);

    // Engines emit their own signal type; bridge it onto the shared
    // channel so the controller stays single-consumer.
    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let bridge_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(signal) = engine_rx.recv().await {
            if bridge_tx.send(ControlEvent::Engine(signal)).is_err() {
                break;
            }
        }
    });

    // Page collaborator: HTML snapshot if configured, empty otherwise
    let page = match &config.page_path {
        Some(path) => HtmlPage::from_file(path)
            .with_context(|| format!("failed to read page snapshot {}", path.display()))?,
        None => {
            warn!("no page snapshot configured (set VOICENAV_PAGE), starting with an empty page");
            HtmlPage::new(String::new())
        }
    };

    let input = ConsoleInput::new(engine_tx.clone());
    let output = ConsoleOutput::new(engine_tx);

    let mut controller = Controller::new(input, output, page, relay_tx.clone());
    let server = Server::new(&config.socket_path, event_tx, relay_tx)?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the controller (processes engine signals and UI requests)
        _ = controller.run(event_rx) => {
            info!("controller exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for a termination signal
        _ = wait_for_shutdown() => {}
    }

    // Cleanup
    info!("shutting down...");
    server.shutdown();
    info!("voicenav-daemon stopped");

    Ok(())
}
