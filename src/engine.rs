//! Bidirectional Protocol Engine
//!
//! The HTTP transport only ever dispatches *inbound* JSON-RPC methods
//! against a stateless per-request [`crate::protocol::Handler`]; the one
//! place it tracks an *outbound* request it issued itself is
//! `transport::sampling::SamplingClient`'s pending-map/oneshot pattern. This
//! module generalizes that pattern into a `Protocol` usable over any
//! [`crate::transport::Transport`], for sampling, elicitation, roots
//! listing, or any other server-to-client (or client-to-server) request.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::transport::Transport;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::{Message, RequestId};
use crate::types::progress::{ProgressNotification, ProgressToken};

/// Default timeout for an outbound request with no explicit override.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised by the protocol engine.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("request timed out")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    #[error("response channel closed before a reply arrived")]
    ChannelClosed,

    #[error("remote returned an error: {0}")]
    Remote(ErrorData),

    #[error("failed to (de)serialize: {0}")]
    Serde(String),
}

/// Handles inbound requests and notifications dispatched by the engine's
/// receive loop. Implemented by whatever owns the MCP-level semantics
/// (a server's tool/resource/prompt registry, or a client's
/// sampling/elicitation/roots callbacks).
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Handle an inbound request, returning the JSON `result` value.
    /// `cancel` is cancelled if a matching `notifications/cancelled` arrives
    /// while this call is still in flight.
    async fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
        cancel: CancellationToken,
    ) -> Result<Value, ErrorData>;

    /// Handle an inbound notification. No response is sent regardless of
    /// the outcome.
    async fn handle_notification(&self, method: &str, params: Option<Value>);

    /// Whether this method may be dispatched at all, independent of
    /// `handle_request`'s own per-call logic. Implementors that negotiate
    /// capabilities (e.g. a client deciding whether it accepts `roots/list`
    /// or sampling requests) override this; the default permits everything.
    fn is_permitted(&self, _method: &str) -> bool {
        true
    }
}

struct Pending {
    reply: oneshot::Sender<Result<Value, ErrorData>>,
    progress: Option<mpsc::Sender<ProgressNotification>>,
}

/// A bidirectional JSON-RPC engine over a [`Transport`].
///
/// Tracks every outbound request this side issued in a `DashMap<RequestId,
/// Pending>`, mirroring `SamplingClient::pending` but generalized to any
/// method, with optional progress routing and cooperative cancellation.
pub struct Protocol<T: Transport> {
    transport: Arc<T>,
    next_id: AtomicI64,
    pending: Arc<DashMap<RequestId, Pending>>,
    inflight_inbound: Arc<DashMap<RequestId, CancellationToken>>,
}

impl<T: Transport + 'static> Protocol<T> {
    /// Wrap a transport. Call [`Protocol::run`] once to start the receive
    /// loop before issuing any requests that expect a reply.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            next_id: AtomicI64::new(1),
            pending: Arc::new(DashMap::new()),
            inflight_inbound: Arc::new(DashMap::new()),
        }
    }

    fn allocate_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Spawn the receive loop, dispatching inbound requests/notifications to
    /// `handler` and resolving outbound pending requests on responses. Only
    /// one loop should run per `Protocol` instance.
    pub fn run<H: InboundHandler + 'static>(&self, handler: Arc<H>) -> tokio::task::JoinHandle<()> {
        let transport = self.transport.clone();
        let pending = self.pending.clone();
        let inflight = self.inflight_inbound.clone();
        let reply_transport = self.transport.clone();

        tokio::spawn(async move {
            while let Some(message) = transport.recv().await {
                match message {
                    Message::Response(response) => {
                        if let Some((_, p)) = pending.remove(&response.id) {
                            let _ = p.reply.send(Ok(response.result));
                        }
                    }
                    Message::Error(error) => {
                        if let Some((_, p)) = pending.remove(&error.id) {
                            let _ = p.reply.send(Err(error.error));
                        }
                    }
                    Message::Notification(notification) => {
                        if notification.method == "notifications/cancelled" {
                            if let Some(id) = extract_cancel_id(&notification.params) {
                                if let Some((_, token)) = inflight.remove(&id) {
                                    token.cancel();
                                }
                            }
                            continue;
                        }

                        if notification.method == "notifications/progress" {
                            if let Some((token, value)) = extract_progress(&notification.params) {
                                forward_progress(&pending, token, value);
                            }
                            continue;
                        }

                        handler
                            .handle_notification(&notification.method, notification.params)
                            .await;
                    }
                    Message::Request(request) => {
                        if !handler.is_permitted(&request.method) {
                            let error = ErrorData::method_not_found(&request.method);
                            let outbound = Message::Error(
                                crate::types::jsonrpc::JsonRpcErrorResponse::new(request.id, error),
                            );
                            let _ = reply_transport.send(outbound).await;
                            continue;
                        }

                        let cancel = CancellationToken::new();
                        inflight.insert(request.id.clone(), cancel.clone());

                        let handler = handler.clone();
                        let transport = reply_transport.clone();
                        let inflight = inflight.clone();
                        let id = request.id.clone();

                        tokio::spawn(async move {
                            let result = handler
                                .handle_request(&request.method, request.params, cancel)
                                .await;
                            inflight.remove(&id);

                            let outbound = match result {
                                Ok(value) => Message::Response(
                                    crate::types::jsonrpc::JsonRpcResponse::success(id, value),
                                ),
                                Err(error) => Message::Error(
                                    crate::types::jsonrpc::JsonRpcErrorResponse::new(id, error),
                                ),
                            };

                            let _ = transport.send(outbound).await;
                        });
                    }
                }
            }
        })
    }

    /// Send a request and wait for the matching response, with the default
    /// timeout and no progress routing.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProtocolError> {
        self.request_with(method, params, DEFAULT_TIMEOUT, None, None).await
    }

    /// Send a request with an explicit timeout and an optional progress
    /// sink: if `progress` is `Some`, inbound `notifications/progress`
    /// carrying the allocated request id as their token are forwarded to it.
    ///
    /// If `cancel` is given and fires before a reply arrives, the wait ends
    /// early with [`ProtocolError::Cancelled`] and a `notifications/cancelled`
    /// is sent to the peer. The same notification is sent if the request
    /// times out, since a timed-out caller has given up on the response just
    /// as surely as one that cancelled explicitly.
    pub async fn request_with(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
        progress: Option<mpsc::Sender<ProgressNotification>>,
        cancel: Option<CancellationToken>,
    ) -> Result<Value, ProtocolError> {
        let id = self.allocate_id();
        let (tx, rx) = oneshot::channel();

        self.pending.insert(
            id.clone(),
            Pending {
                reply: tx,
                progress,
            },
        );

        let message = Message::request(id.clone(), method, params);
        if let Err(e) = self.transport.send(message).await {
            self.pending.remove(&id);
            return Err(e.into());
        }

        let outcome = match cancel {
            Some(ref token) => {
                tokio::select! {
                    result = tokio::time::timeout(timeout, rx) => result,
                    _ = token.cancelled() => {
                        self.pending.remove(&id);
                        self.send_cancelled(&id, "cancelled by caller").await;
                        return Err(ProtocolError::Cancelled);
                    }
                }
            }
            None => tokio::time::timeout(timeout, rx).await,
        };

        match outcome {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(error))) => Err(ProtocolError::Remote(error)),
            Ok(Err(_)) => {
                self.pending.remove(&id);
                Err(ProtocolError::ChannelClosed)
            }
            Err(_) => {
                self.pending.remove(&id);
                self.send_cancelled(&id, "request timed out").await;
                Err(ProtocolError::Timeout)
            }
        }
    }

    async fn send_cancelled(&self, id: &RequestId, reason: &str) {
        let _ = self
            .notify(
                "notifications/cancelled",
                serde_json::json!({ "requestId": id, "reason": reason }),
            )
            .await;
    }

    /// Send a notification (no reply expected).
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ProtocolError> {
        self.transport
            .send(Message::notification(method, params))
            .await
            .map_err(ProtocolError::from)
    }

    /// Number of outbound requests still awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

fn extract_cancel_id(params: &Option<Value>) -> Option<RequestId> {
    let params = params.as_ref()?;
    serde_json::from_value(params.get("requestId")?.clone()).ok()
}

fn extract_progress(params: &Option<Value>) -> Option<(ProgressToken, ProgressNotification)> {
    let params = params.as_ref()?;
    let notification: ProgressNotification = serde_json::from_value(params.clone()).ok()?;
    Some((notification.progress_token.clone(), notification))
}

fn forward_progress(
    pending: &DashMap<RequestId, Pending>,
    token: ProgressToken,
    notification: ProgressNotification,
) {
    let id = match token {
        ProgressToken::Integer(n) => RequestId::Number(n),
        ProgressToken::String(s) => RequestId::String(s),
    };

    if let Some(entry) = pending.get(&id) {
        if let Some(ref sink) = entry.progress {
            let _ = sink.try_send(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl InboundHandler for EchoHandler {
        async fn handle_request(
            &self,
            method: &str,
            params: Option<Value>,
            _cancel: CancellationToken,
        ) -> Result<Value, ErrorData> {
            Ok(json!({ "echo": method, "params": params }))
        }

        async fn handle_notification(&self, _method: &str, _params: Option<Value>) {}
    }

    #[tokio::test]
    async fn test_request_round_trips_through_in_memory_transport() {
        let (client_transport, server_transport) = InMemoryTransport::pair();
        let client = Protocol::new(client_transport);
        let server = Protocol::new(server_transport);

        server.run(Arc::new(EchoHandler));

        let result = client.request("ping", json!({"n": 1})).await.unwrap();
        assert_eq!(result["echo"], "ping");
        assert_eq!(result["params"]["n"], 1);
    }

    #[tokio::test]
    async fn test_request_times_out_with_no_responder() {
        let (client_transport, _server_transport) = InMemoryTransport::pair();
        let client = Protocol::new(client_transport);

        let result = client
            .request_with("ping", json!({}), Duration::from_millis(20), None, None)
            .await;

        assert!(matches!(result, Err(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn test_pending_count_tracks_outstanding_requests() {
        let (client_transport, _server_transport) = InMemoryTransport::pair();
        let client = Arc::new(Protocol::new(client_transport));
        assert_eq!(client.pending_count(), 0);

        let c = client.clone();
        let handle = tokio::spawn(async move {
            let _ = c.request_with("ping", json!({}), Duration::from_millis(50), None, None).await;
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(client.pending_count(), 1);

        handle.await.unwrap();
        assert_eq!(client.pending_count(), 0);
    }
}
