//! Unix domain socket server for IPC
//!
//! Requests are forwarded to the controller task and answered with its
//! reply; subscribed clients additionally receive relay events as they
//! happen.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::controller::ControlEvent;
use crate::events::RelayEvent;

use super::protocol::{Request, Response};

/// Upper bound on a single IPC message.
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// IPC server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    control_tx: mpsc::UnboundedSender<ControlEvent>,
    relay_tx: broadcast::Sender<RelayEvent>,
}

impl Server {
    /// Bind the socket, replacing a stale one from a previous run.
    pub fn new(
        socket_path: &Path,
        control_tx: mpsc::UnboundedSender<ControlEvent>,
        relay_tx: broadcast::Sender<RelayEvent>,
    ) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            control_tx,
            relay_tx,
        })
    }

    /// Accept clients until the process shuts down.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let control_tx = self.control_tx.clone();
                    let relay_tx = self.relay_tx.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, control_tx, relay_tx).await {
                            warn!(?e, "client handler error");
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Remove the socket file on the way out.
    pub fn shutdown(&self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }
        info!("IPC server shutdown complete");
    }
}

/// Handle a single client connection. Responses and pushed events share
/// the write half behind a mutex so frames never interleave.
async fn handle_client(
    stream: UnixStream,
    control_tx: mpsc::UnboundedSender<ControlEvent>,
    relay_tx: broadcast::Sender<RelayEvent>,
) -> Result<()> {
    let (mut reader, writer) = stream.into_split();
    let writer = Arc::new(Mutex::new(writer));
    let mut forwarder: Option<JoinHandle<()>> = None;

    let result = serve_client(&mut reader, &writer, &mut forwarder, &control_tx, &relay_tx).await;

    if let Some(task) = forwarder {
        task.abort();
    }
    result
}

async fn serve_client(
    reader: &mut (impl AsyncRead + Unpin),
    writer: &Arc<Mutex<OwnedWriteHalf>>,
    forwarder: &mut Option<JoinHandle<()>>,
    control_tx: &mpsc::UnboundedSender<ControlEvent>,
    relay_tx: &broadcast::Sender<RelayEvent>,
) -> Result<()> {
    loop {
        let Some(request) = read_message(reader).await? else {
            debug!("client disconnected");
            return Ok(());
        };
        debug!(?request, "received request");

        if matches!(request, Request::Subscribe) && forwarder.is_none() {
            debug!("client subscribed to notifications");
            *forwarder = Some(tokio::spawn(forward_events(
                relay_tx.subscribe(),
                Arc::clone(writer),
            )));
        }

        let response = dispatch(request, control_tx).await;
        send_message(&mut *writer.lock().await, &response).await?;
    }
}

/// Push relay events to one subscribed client until it goes away.
async fn forward_events(
    mut relay_rx: broadcast::Receiver<RelayEvent>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
) {
    loop {
        match relay_rx.recv().await {
            Ok(event) => {
                let mut writer = writer.lock().await;
                if send_message(&mut *writer, &event).await.is_err() {
                    debug!("client gone, stopping notifications");
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "notification receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// Forward a request to the controller and wait for its reply.
async fn dispatch(request: Request, control_tx: &mpsc::UnboundedSender<ControlEvent>) -> Response {
    let (reply_tx, reply_rx) = oneshot::channel();
    let event = ControlEvent::Request {
        request,
        reply: reply_tx,
    };

    if control_tx.send(event).is_err() {
        return unavailable();
    }
    match reply_rx.await {
        Ok(response) => response,
        Err(_) => unavailable(),
    }
}

fn unavailable() -> Response {
    Response::Error {
        code: "unavailable".to_string(),
        message: "controller is not running".to_string(),
    }
}

/// Read one length-prefixed JSON message. `None` means the peer closed
/// the connection cleanly or sent an oversized frame.
async fn read_message<R>(reader: &mut R) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_BYTES {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;

    let request = serde_json::from_slice(&msg_buf).context("failed to parse request")?;
    Ok(Some(request))
}

/// Send a length-prefixed JSON message.
async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ListeningState;

    #[tokio::test]
    async fn test_framing_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        send_message(&mut client, &Request::GetStatus).await.unwrap();
        let request = read_message(&mut server).await.unwrap();

        assert!(matches!(request, Some(Request::GetStatus)));
    }

    #[tokio::test]
    async fn test_clean_disconnect_reads_none() {
        let (client, mut server) = tokio::io::duplex(4096);
        drop(client);

        let request = read_message(&mut server).await.unwrap();
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        let len = ((MAX_MESSAGE_BYTES + 1) as u32).to_le_bytes();
        client.write_all(&len).await.unwrap();

        let request = read_message(&mut server).await.unwrap();
        assert!(request.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_controller_task() {
        let (control_tx, mut control_rx) = mpsc::unbounded_channel();

        // Stand-in for the controller loop: ack every request.
        tokio::spawn(async move {
            while let Some(event) = control_rx.recv().await {
                if let ControlEvent::Request { reply, .. } = event {
                    let _ = reply.send(Response::Ack {
                        listening: ListeningState::Active,
                    });
                }
            }
        });

        let response = dispatch(Request::StartListening, &control_tx).await;
        assert!(matches!(
            response,
            Response::Ack {
                listening: ListeningState::Active
            }
        ));
    }

    #[tokio::test]
    async fn test_dispatch_without_controller_is_an_error() {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        drop(control_rx);

        let response = dispatch(Request::Ping, &control_tx).await;
        assert!(matches!(response, Response::Error { .. }));
    }
}
