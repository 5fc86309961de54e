//! protomind - MCP (Model Context Protocol) runtime library for Rust
//!
//! A transport-agnostic, bidirectional implementation of the MCP 2025-06-18
//! specification: build MCP servers and clients over stdio, an in-memory
//! channel, or Streamable HTTP (axum-based).
//!
//! # Features
//!
//! - **Server**: Build MCP servers with the `Handler` trait or the
//!   registry-backed `Server` façade
//! - **Client**: Connect to MCP servers (enable the `client` feature)
//! - **Tools / Resources / Prompts**: expose callable tools, URI-addressed
//!   resources, and prompt templates
//! - **Sampling / Elicitation / Roots**: server-initiated requests back to
//!   the connected client, routed through the bidirectional `Protocol` engine
//! - **Tasks**: long-running tool calls that outlive a single request/response
//! - **Auth**: an `AuthProvider` contract for bearer/OAuth-protected transports
//!
//! # Server Example
//!
//! ```rust,ignore
//! use protomind::{Handler, Tool, CallToolResult, Content, Implementation};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl Handler for MyHandler {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool::new("hello", "Say hello")]
//!     }
//!
//!     async fn call_tool(&self, name: &str, _args: serde_json::Value)
//!         -> Result<CallToolResult, protomind::ErrorData>
//!     {
//!         Ok(CallToolResult::success(vec![Content::text("Hello!")]))
//!     }
//!
//!     fn server_info(&self) -> Implementation {
//!         Implementation::new("my-server", "0.1.0")
//!     }
//! }
//!
//! // Build router
//! let state = std::sync::Arc::new(protomind::McpState::new(
//!     MyHandler,
//!     "my-server",
//!     "0.1.0",
//! ));
//! let router = protomind::router(state);
//! ```
//!
//! # Client Example (requires `client` feature)
//!
//! ```rust,ignore
//! use protomind::client::McpClient;
//!
//! let client = McpClient::new("http://localhost:8080/mcp");
//! client.initialize().await?;
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("my_tool", json!({"key": "value"})).await?;
//! ```

pub mod auth;
pub mod engine;
pub mod protocol;
pub mod schema;
pub mod schema_helpers;
pub mod server;
pub mod session;
pub mod task;
pub mod transport;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

// Re-export commonly used types at crate root
pub use types::content::Content;
pub use types::error::ErrorData;
pub use types::jsonrpc::{JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, Message, RequestId};
pub use types::protocol::{Implementation, ServerCapabilities};
pub use types::prompt::{Prompt, PromptArgument, PromptMessage};
pub use types::resource::{Resource, ResourceContents, ResourceTemplate};
pub use types::roots::{ListRootsResult, Root};
pub use types::tool::{CallToolResult, Tool, ToolAnnotations, ToolSchema};

// Re-export session types
pub use session::{spawn_cleanup_task, InMemorySessionStore, Session, SessionStats, SessionStore};

// Re-export protocol types
pub use protocol::{Handler, Sampler, ToolContext};

// Re-export transport types
pub use transport::{dual_router, router, McpState, Transport};

// Re-export the bidirectional engine
pub use engine::{Protocol, ProtocolError};

// Re-export task subsystem
pub use task::{TaskMessageQueue, TaskResultHandler, TaskSession, TaskStatus, TaskStore};

// Re-export schema subset
pub use schema::{SchemaNode, ValidationError};

// Re-export auth contract
pub use auth::{AuthError, AuthProvider, Token};

// Re-export server façade
pub use server::{PromptRegistry, ResourceRegistry, Server, ToolRegistry};

// Re-export schema helpers
pub use schema_helpers::schema_for;
