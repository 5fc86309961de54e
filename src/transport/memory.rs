//! In-Memory Paired Transport
//!
//! Wires two endpoints directly together through channels, skipping any
//! wire encoding. Used for same-process hosts (a client and server running
//! in one binary) and for tests that exercise the engine without a real
//! transport.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::traits::{Transport, TransportError};
use crate::types::jsonrpc::Message;

/// One end of an in-memory transport pair.
pub struct InMemoryTransport {
    outbound: mpsc::Sender<Message>,
    inbound: Mutex<mpsc::Receiver<Message>>,
}

impl InMemoryTransport {
    /// Create a connected pair: messages sent on one side arrive on the
    /// other's `recv`, and vice versa.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(64);
        let (b_tx, b_rx) = mpsc::channel(64);

        let a = InMemoryTransport {
            outbound: b_tx,
            inbound: Mutex::new(a_rx),
        };
        let b = InMemoryTransport {
            outbound: a_tx,
            inbound: Mutex::new(b_rx),
        };

        (a, b)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
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
    async fn test_pair_delivers_messages_in_both_directions() {
        let (a, b) = InMemoryTransport::pair();

        a.send(Message::request(1, "ping", json!({}))).await.unwrap();
        let received = b.recv().await.unwrap();
        assert_eq!(received.id(), Some(&crate::types::jsonrpc::RequestId::Number(1)));

        b.send(Message::notification("notifications/initialized", json!({})))
            .await
            .unwrap();
        let received = a.recv().await.unwrap();
        assert_eq!(received.id(), None);
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_drop() {
        let (a, b) = InMemoryTransport::pair();
        drop(b);
        assert!(a.recv().await.is_none());
    }
}
