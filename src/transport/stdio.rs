//! Stdio Transport
//!
//! Newline-delimited JSON over the current process's stdin/stdout, the
//! framing every MCP stdio server and client speaks: one JSON-RPC message
//! per line, UTF-8, no embedded newlines.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use super::traits::{Transport, TransportError};
use crate::types::jsonrpc::Message;

/// Transport over the process's own stdin/stdout.
///
/// Reading happens on a background task so `recv` can be called
/// concurrently with `send` without fighting over stdin's lock.
pub struct StdioTransport {
    stdout: Mutex<tokio::io::Stdout>,
    inbound: Mutex<mpsc::Receiver<Message>>,
}

impl StdioTransport {
    /// Spawn the stdin reader and return a ready-to-use transport.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Message>(line) {
                            Ok(message) => {
                                if tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to decode stdio message, dropping line");
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::info!("stdin closed, stdio transport shutting down");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "error reading stdin");
                        break;
                    }
                }
            }
        });

        Self {
            stdout: Mutex::new(tokio::io::stdout()),
            inbound: Mutex::new(rx),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let mut line =
            serde_json::to_string(&message).map_err(|e| TransportError::Encode(e.to_string()))?;
        line.push('\n');

        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn recv(&self) -> Option<Message> {
        self.inbound.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_decode_line_round_trips() {
        let message = Message::request(1, "ping", json!({}));
        let line = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.id(), message.id());
    }
}
