//! Transport Trait
//!
//! A `Transport` moves JSON-RPC [`Message`]s between this process and the
//! other side of an MCP connection, without knowing anything about MCP
//! semantics itself. The bidirectional [`crate::engine::Protocol`] is built
//! against this trait so the same engine works over stdio, an in-process
//! channel, or Streamable HTTP.

use async_trait::async_trait;

use crate::types::jsonrpc::Message;

/// Error returned by a [`Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(String),
}

/// A bidirectional channel for JSON-RPC messages.
///
/// Implementations are expected to be cheaply cloneable or already behind an
/// `Arc` at the call site; `send`/`recv` both take `&self` so a single
/// transport can be shared between the read loop and any number of
/// concurrent outbound callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single message.
    async fn send(&self, message: Message) -> Result<(), TransportError>;

    /// Receive the next inbound message, or `None` once the transport has
    /// closed and no further messages will arrive.
    async fn recv(&self) -> Option<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Decode("unexpected eof".into());
        assert_eq!(err.to_string(), "failed to decode message: unexpected eof");
    }
}
