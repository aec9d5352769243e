//! Unix domain socket server for IPC
//!
//! The server never touches the timer. Each request is handed to the UI loop,
//! which owns the engine, and the reply is written back to the client.

use anyhow::{Context, Result};
use pomodoro_ipc::{decode_line, encode_line, Command, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// A command waiting for the UI loop, with the slot for its reply.
pub struct Request {
    pub command: Command,
    pub reply: oneshot::Sender<Response>,
}

pub fn channel() -> (mpsc::Sender<Request>, mpsc::Receiver<Request>) {
    mpsc::channel(32)
}

pub async fn start(socket_path: impl AsRef<Path>, requests: mpsc::Sender<Request>) -> Result<()> {
    let socket_path = socket_path.as_ref();
    // Remove old socket if it exists
    let _ = std::fs::remove_file(socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind IPC socket at {:?}", socket_path))?;
    info!("IPC server listening on {:?}", socket_path);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let requests = requests.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, requests).await {
                        error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, requests: mpsc::Sender<Request>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader.read_line(&mut line).await?;
    let response = match decode_line::<Command>(&line) {
        Ok(command) => {
            debug!(?command, "IPC command received");
            forward(command, &requests).await
        }
        Err(e) => {
            warn!("Malformed IPC request: {}", e);
            Response::Error(format!("malformed request: {}", e))
        }
    };

    writer.write_all(&encode_line(&response)?).await?;
    writer.shutdown().await?;
    Ok(())
}

async fn forward(command: Command, requests: &mpsc::Sender<Request>) -> Response {
    let (reply, response) = oneshot::channel();
    if requests.send(Request { command, reply }).await.is_err() {
        return Response::Error("timer is shutting down".to_string());
    }
    response
        .await
        .unwrap_or_else(|_| Response::Error("timer dropped the request".to_string()))
}
