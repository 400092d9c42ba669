//! Newline-delimited JSON transport for the CLI binary.
//!
//! The core crates stay framing-agnostic; this module is the one place the
//! console client commits to a concrete channel (one JSON message per line
//! over TCP). The daemon end owns compression and authentication.

use anyhow::anyhow;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use squall_client::{ChannelTransport, Gateway};
use squall_wire::Message;

use crate::client::{CliError, CliResult};

/// Connect to the daemon and wire a gateway onto the socket.
pub(crate) async fn connect(addr: &str) -> CliResult<Gateway> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to connect to daemon at {addr}: {err}")))?;
    let (read_half, mut write_half) = stream.into_split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let line = match message.to_json() {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unencodable message");
                    continue;
                }
            };
            if write_half.write_all(line.as_bytes()).await.is_err()
                || write_half.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match Message::from_json(&line) {
                    Ok(message) => {
                        if inbound_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "discarding malformed line from daemon");
                    }
                },
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "daemon connection read failed");
                    break;
                }
            }
        }
    });

    Ok(Gateway::connect(
        ChannelTransport::new(outbound_tx),
        inbound_rx,
    ))
}
