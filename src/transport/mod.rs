//! MCP HTTP Transport
//!
//! Implements MCP HTTP transports:
//!
//! ## Streamable HTTP Transport (default, via `router()`)
//! - POST / - Send JSON-RPC request, receive response directly
//! - DELETE / - Terminate session
//! - Session ID via Mcp-Session-Id header
//!
//! ## SSE Transport (legacy, via `dual_router()` only)
//! - GET /sse - Establish SSE connection, receive responses
//! - POST /message - Send JSON-RPC requests

mod event_store;
mod logger;
mod memory;
mod message;
mod notifier;
mod sampling;
mod sse;
mod stdio;
mod streamable;
mod traits;

pub use event_store::{EventStore, StoredEvent, DEFAULT_BACKLOG};
pub use logger::McpLogger;
pub use memory::InMemoryTransport;
pub use message::message_handler;
pub use notifier::ResourceNotifier;
pub use sampling::{SamplingClient, SamplingError};
pub use sse::sse_handler;
pub use stdio::StdioTransport;
pub use streamable::{delete_handler, streamable_handler};
pub use traits::{Transport, TransportError};

use axum::Router;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::session::{InMemorySessionStore, SessionStore};
use crate::task::{TaskResultHandler, TaskStore};

/// Shared state for MCP handlers.
pub struct McpState<H> {
    /// The application's tool/resource/prompt handler.
    pub handler: Arc<H>,

    /// Session store.
    pub sessions: Arc<dyn SessionStore>,

    /// Server name for protocol responses.
    pub server_name: String,

    /// Server version for protocol responses.
    pub server_version: String,

    /// Sampling client for server-initiated LLM requests.
    pub sampling_client: Arc<SamplingClient>,

    /// Logger for `logging/setLevel`-gated `notifications/message`.
    pub logger: Arc<McpLogger>,

    /// Notifier for resource update/list-changed broadcasts.
    pub notifier: Arc<ResourceNotifier>,

    /// Cancellation tokens for requests currently being handled, keyed by
    /// `"{session_id}:{request_id}"`. A `notifications/cancelled` for a key
    /// present here trips the token so the in-flight handler can observe it.
    pub inflight: Arc<DashMap<String, CancellationToken>>,

    /// Store backing `tasks/create`, `tasks/get`, `tasks/result`,
    /// `tasks/cancel`, `tasks/list`, and task-delegated `tools/call`.
    pub tasks: Arc<TaskStore>,

    /// Wraps `tasks` to report a task-capable tool's outcome without each
    /// call site building the success/failure pair by hand.
    pub task_results: Arc<TaskResultHandler>,
}

impl<H> McpState<H> {
    /// Create new MCP state with the given handler.
    pub fn new(handler: H, server_name: impl Into<String>, server_version: impl Into<String>) -> Self {
        Self::with_session_store(handler, Arc::new(InMemorySessionStore::new()), server_name, server_version)
    }

    /// Create new MCP state with a custom session store.
    pub fn with_session_store(
        handler: H,
        sessions: Arc<dyn SessionStore>,
        server_name: impl Into<String>,
        server_version: impl Into<String>,
    ) -> Self {
        let tasks = Arc::new(TaskStore::new());
        Self {
            handler: Arc::new(handler),
            logger: Arc::new(McpLogger::new(sessions.clone())),
            notifier: Arc::new(ResourceNotifier::new(sessions.clone())),
            sessions,
            server_name: server_name.into(),
            server_version: server_version.into(),
            sampling_client: Arc::new(SamplingClient::new()),
            inflight: Arc::new(DashMap::new()),
            task_results: Arc::new(TaskResultHandler::new(tasks.clone())),
            tasks,
        }
    }
}

/// Build the `"{session_id}:{request_id}"` key used in
/// [`McpState::inflight`].
pub(crate) fn inflight_key(session_id: &str, id: &crate::types::jsonrpc::RequestId) -> String {
    format!("{session_id}:{id}")
}

/// Build an axum Router for MCP Streamable HTTP transport — the default and
/// recommended transport.
///
/// Routes:
/// - POST / - JSON-RPC request/response
/// - DELETE / - Session termination
///
/// Session ID is passed via Mcp-Session-Id header.
pub fn router<H>(state: Arc<McpState<H>>) -> Router
where
    H: crate::Handler + 'static,
{
    Router::new()
        .route("/", axum::routing::post(streamable_handler::<H>))
        .route("/", axum::routing::delete(delete_handler::<H>))
        .with_state(state)
}

/// Build an axum Router supporting both transports, for hosts that still
/// have clients speaking the legacy 2024-11-05 SSE transport.
///
/// Routes:
/// - POST / - Streamable HTTP (recommended)
/// - DELETE / - Session termination
/// - GET /sse - SSE transport (legacy)
/// - POST /message - SSE message endpoint (legacy)
pub fn dual_router<H>(state: Arc<McpState<H>>) -> Router
where
    H: crate::Handler + 'static,
{
    Router::new()
        // Streamable HTTP transport (primary)
        .route("/", axum::routing::post(streamable_handler::<H>))
        .route("/", axum::routing::delete(delete_handler::<H>))
        // SSE transport (legacy/fallback)
        .route("/sse", axum::routing::get(sse_handler::<H>))
        .route("/message", axum::routing::post(message_handler::<H>))
        .with_state(state)
}
