//! MCP Protocol Dispatch
//!
//! Routes JSON-RPC methods to their handlers.
//!
//! Implements OpenTelemetry JSON-RPC semantic conventions for observability.
//! See: https://opentelemetry.io/docs/specs/semconv/rpc/json-rpc/

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::task::TaskMeta;
use crate::transport::{inflight_key, McpState};
use crate::types::completion::{CompleteParams, CompletionResult};
use crate::types::error::ErrorData;
use crate::types::jsonrpc::JsonRpcMessage;
use crate::types::logging::{LogLevel, LogMessage};
use crate::types::progress::{ProgressNotification, ProgressToken};
use crate::types::prompt::{GetPromptResult, ListPromptsResult, Prompt};
use crate::types::protocol::{
    InitializeParams, InitializeResult, Implementation, ServerCapabilities,
};
use crate::types::resource::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceResult,
    Resource, ResourceTemplate,
};
use crate::types::subscription::{SubscribeParams, UnsubscribeParams};
use crate::types::task::{CreateTaskParams, ListTasksResult, RelatedTask, Task, TaskIdParams};
use crate::types::tool::{CallToolParams, CallToolResult, ListToolsResult, Tool};

/// Protocol versions this server accepts from a client at `initialize`.
/// A client offering anything else still gets a reply (the server's own
/// `PROTOCOL_VERSION`), per spec, but the response's `protocolVersion` tells
/// it to downgrade or disconnect rather than silently proceeding as if the
/// versions matched.
const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &[crate::types::protocol::PROTOCOL_VERSION, "2025-03-26"];

/// Sender for progress notifications.
///
/// Tools can use this to send progress updates back to the client during
/// long-running operations.
pub type ProgressSender = tokio::sync::mpsc::Sender<ProgressNotification>;

/// Context passed to tool calls for sending progress updates and accessing session info.
#[derive(Clone)]
pub struct ToolContext {
    /// Session ID for this request.
    pub session_id: String,

    /// Progress token from the request metadata (if client requested progress).
    pub progress_token: Option<ProgressToken>,

    /// Sender for progress notifications (if client requested progress).
    pub progress_sender: Option<ProgressSender>,

    /// Sampler for requesting LLM inference from the client (if supported).
    pub sampler: Option<Sampler>,

    /// Cancelled if a matching `notifications/cancelled` arrives while this
    /// call is still in flight.
    pub cancel: CancellationToken,
}

/// Handle for making sampling requests to the connected client's LLM.
#[derive(Clone)]
pub struct Sampler {
    client: Arc<crate::transport::SamplingClient>,
    sessions: Arc<dyn crate::session::SessionStore>,
    session_id: String,
}

impl Sampler {
    /// Create a new sampler for the given session.
    pub fn new(
        client: Arc<crate::transport::SamplingClient>,
        sessions: Arc<dyn crate::session::SessionStore>,
        session_id: String,
    ) -> Self {
        Self {
            client,
            sessions,
            session_id,
        }
    }

    /// Request a simple text completion from the client's LLM.
    ///
    /// This is a convenience wrapper that creates a simple user message request.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String, crate::transport::SamplingError> {
        use crate::types::sampling::{SamplingMessage, SamplingRequest};

        let request = SamplingRequest {
            messages: vec![SamplingMessage::user(question)],
            max_tokens: Some(500),
            ..Default::default()
        };

        let response = self.sample(request).await?;

        // Extract text from response content
        if let Some(text_content) = response.content.as_text() {
            Ok(text_content.to_string())
        } else {
            Ok(String::new())
        }
    }

    /// Request sampling with full control over parameters.
    pub async fn sample(
        &self,
        request: crate::types::sampling::SamplingRequest,
    ) -> Result<crate::types::sampling::SamplingResponse, crate::transport::SamplingError> {
        // Get the session
        let session = self
            .sessions
            .get(&self.session_id)
            .ok_or(crate::transport::SamplingError::SessionNotFound)?;

        // Send sampling request through the client
        self.client.sample(session, request, None).await
    }
}

impl ToolContext {
    /// Send a progress notification to the client.
    ///
    /// Does nothing if no progress sender is available.
    pub async fn send_progress(&self, progress: ProgressNotification) {
        if let Some(ref sender) = self.progress_sender {
            let _ = sender.send(progress).await;
        }
    }

    /// Check if progress reporting is enabled for this request.
    pub fn has_progress(&self) -> bool {
        self.progress_token.is_some()
    }

    /// Whether the client has asked to cancel this call.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Handler trait for MCP server implementations.
///
/// Implement this trait to provide tools, resources, and prompts.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    // === Required: Tools ===

    /// Return the list of available tools.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData>;

    /// Execute a tool call with context for progress reporting.
    ///
    /// Default implementation calls `call_tool` (ignoring context).
    /// Override this to support progress notifications for long-running operations.
    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        _context: ToolContext,
    ) -> Result<CallToolResult, ErrorData> {
        self.call_tool(name, arguments).await
    }

    // === Required: Server Info ===

    /// Return server implementation info.
    fn server_info(&self) -> Implementation;

    // === Optional: Resources ===

    /// Return the list of available resources.
    fn resources(&self) -> Vec<Resource> {
        vec![]
    }

    /// Return the list of resource templates.
    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        vec![]
    }

    /// Read a resource by URI.
    async fn read_resource(&self, _uri: &str) -> Result<ReadResourceResult, ErrorData> {
        Err(ErrorData::method_not_found("resources/read"))
    }

    // === Optional: Prompts ===

    /// Return the list of available prompts.
    fn prompts(&self) -> Vec<Prompt> {
        vec![]
    }

    /// Get a prompt by name with arguments.
    async fn get_prompt(
        &self,
        _name: &str,
        _arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, ErrorData> {
        Err(ErrorData::method_not_found("prompts/get"))
    }

    // === Optional: Subscriptions ===

    /// Subscribe the calling session to updates for `uri`. The default
    /// implementation just acknowledges; session-level bookkeeping happens
    /// in `dispatch_inner` regardless of what this returns.
    async fn subscribe_resource(&self, _uri: &str) -> Result<(), ErrorData> {
        Ok(())
    }

    /// Unsubscribe the calling session from updates for `uri`.
    async fn unsubscribe_resource(&self, _uri: &str) -> Result<(), ErrorData> {
        Ok(())
    }

    // === Optional: Completion ===

    /// Suggest completions for a partial prompt/resource/tool argument.
    async fn complete(&self, _params: CompleteParams) -> Result<CompletionResult, ErrorData> {
        Ok(CompletionResult::empty())
    }

    // === Optional: Metadata ===

    /// Return instructions for the LLM.
    fn instructions(&self) -> Option<String> {
        None
    }

    /// Return server capabilities.
    fn capabilities(&self) -> ServerCapabilities {
        let mut caps = ServerCapabilities::default().enable_tools();

        if !self.resources().is_empty() || !self.resource_templates().is_empty() {
            caps = caps.enable_resources();
        }

        if !self.prompts().is_empty() {
            caps = caps.enable_prompts();
        }

        caps
    }
}

/// Dispatch a JSON-RPC message to the appropriate handler.
///
/// Creates an OpenTelemetry span following JSON-RPC semantic conventions:
/// - `rpc.system` = "jsonrpc"
/// - `rpc.method` = the JSON-RPC method name
/// - `rpc.jsonrpc.version` = "2.0"
/// - `rpc.jsonrpc.request_id` = the request ID (if present)
/// - `mcp.session_id` = the MCP session identifier
pub async fn dispatch<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    // Format request_id for OTEL (cast to string per spec)
    let request_id_str = message
        .id
        .as_ref()
        .map(|id| format!("{}", id))
        .unwrap_or_default();

    // Create span following JSON-RPC semantic conventions
    // Span name format: mcp/{method}
    let span = tracing::info_span!(
        "mcp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %message.method,
        rpc.jsonrpc.version = "2.0",
        rpc.jsonrpc.request_id = %request_id_str,
        mcp.session_id = %session_id,
        // Error fields - recorded on failure
        error.type = tracing::field::Empty,
        rpc.jsonrpc.error_code = tracing::field::Empty,
        rpc.jsonrpc.error_message = tracing::field::Empty,
    );

    async {
        let result = dispatch_inner(state, session_id, message).await;

        // Record error on span if dispatch failed
        if let Err(ref error) = result {
            record_error_on_span(error);
        }

        result
    }
    .instrument(span)
    .await
}

/// Record JSON-RPC error on the current span following OTEL conventions.
fn record_error_on_span(error: &ErrorData) {
    let span = tracing::Span::current();
    span.record("error.type", error_type_for_code(error.code));
    span.record("rpc.jsonrpc.error_code", error.code);
    span.record("rpc.jsonrpc.error_message", error.message.as_str());
}

/// Map JSON-RPC error codes to error.type values.
fn error_type_for_code(code: i32) -> &'static str {
    match code {
        -32700 => "parse_error",
        -32600 => "invalid_request",
        -32601 => "method_not_found",
        -32602 => "invalid_params",
        -32603 => "internal_error",
        _ => "application_error",
    }
}

/// Inner dispatch without span (called from instrumented outer function).
async fn dispatch_inner<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    check_capability(state, &message.method)?;

    match message.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, session_id, message).await,
        "notifications/initialized" => Ok(Value::Null),
        "ping" => Ok(serde_json::json!({})),

        // Tools
        "tools/list" => handle_list_tools(state).await,
        "tools/call" => handle_call_tool(state, session_id, message).await,

        // Resources
        "resources/list" => handle_list_resources(state).await,
        "resources/templates/list" => handle_list_resource_templates(state).await,
        "resources/read" => handle_read_resource(state, message).await,

        // Prompts
        "prompts/list" => handle_list_prompts(state).await,
        "prompts/get" => handle_get_prompt(state, message).await,

        // Subscriptions
        "resources/subscribe" => handle_subscribe(state, session_id, message).await,
        "resources/unsubscribe" => handle_unsubscribe(state, session_id, message).await,

        // Logging
        "logging/setLevel" => handle_set_level(state, session_id, message).await,

        // Completion
        "completion/complete" => handle_complete(state, message).await,

        // Tasks
        "tasks/create" => handle_tasks_create(state, message).await,
        "tasks/get" => handle_tasks_get(state, message).await,
        "tasks/result" => handle_tasks_result(state, message).await,
        "tasks/cancel" => handle_tasks_cancel(state, message).await,
        "tasks/list" => handle_tasks_list(state).await,

        // Unknown
        _ => Err(ErrorData::method_not_found(&message.method)),
    }
}

/// Reject a method whose capability family the server never declared at
/// `initialize`. Core lifecycle/tool/task methods have no corresponding
/// `ServerCapabilities` field and are always permitted.
fn check_capability<H: Handler>(state: &Arc<McpState<H>>, method: &str) -> Result<(), ErrorData> {
    let caps = state.handler.capabilities();

    let enabled = match method {
        "resources/list" | "resources/templates/list" | "resources/read" | "resources/subscribe"
        | "resources/unsubscribe" => caps.resources.is_some(),
        "prompts/list" | "prompts/get" => caps.prompts.is_some(),
        "logging/setLevel" => caps.logging.is_some(),
        "completion/complete" => caps.completions.is_some(),
        _ => true,
    };

    if enabled {
        Ok(())
    } else {
        Err(ErrorData::method_not_found(method))
    }
}

async fn handle_initialize<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: InitializeParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid initialize params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing initialize params"))?;

    if !SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
        return Err(ErrorData::invalid_params(format!(
            "Unsupported protocol version '{}'; this server supports {:?}",
            params.protocol_version, SUPPORTED_PROTOCOL_VERSIONS
        )));
    }

    // Store client info in session
    state.sessions.set_initialized(session_id, params.client_info);
    state.sessions.set_capabilities(session_id, params.capabilities);

    let result = InitializeResult::new(
        Implementation::new(&state.server_name, &state.server_version),
        state.handler.capabilities(),
    );

    let result = if let Some(instructions) = state.handler.instructions() {
        result.with_instructions(instructions)
    } else {
        result
    };

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_list_tools<H: Handler>(state: &Arc<McpState<H>>) -> Result<Value, ErrorData> {
    let tools = state.handler.tools();
    let result = ListToolsResult::all(tools);

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_call_tool<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CallToolParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid call params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing call params"))?;

    let arguments = params
        .arguments
        .map(Value::Object)
        .unwrap_or(Value::Object(serde_json::Map::new()));

    let tool = state
        .handler
        .tools()
        .into_iter()
        .find(|t| t.name == params.name)
        .ok_or_else(|| ErrorData::tool_not_found(&params.name))?;

    crate::schema::SchemaNode::from(&tool.input_schema)
        .validate(&arguments)
        .map_err(|e| ErrorData::invalid_params(e.to_invalid_params_message()))?;

    let meta = request.params.as_ref().and_then(|p| p.get("_meta"));
    let request_task = meta
        .and_then(|m| m.get("requestTask"))
        .and_then(|t| t.as_bool())
        .unwrap_or(false);

    if tool.is_task_capable() && request_task {
        return delegate_to_task(state, session_id, request, &params.name, arguments).await;
    }

    // Extract progress token from _meta field if present
    let progress_token = meta
        .and_then(|m| m.get("progressToken"))
        .and_then(|t| serde_json::from_value::<ProgressToken>(t.clone()).ok());

    // Create progress channel if token is present
    let (progress_tx, progress_rx) = if progress_token.is_some() {
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    // Spawn task to forward progress notifications to the client's SSE channel
    if let (Some(_token), Some(mut rx)) = (progress_token.clone(), progress_rx) {
        let session = state.sessions.get(session_id);
        let session_tx = session.and_then(|s| s.tx.clone());

        tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                // Send as a JSON-RPC notification
                let notification = JsonRpcMessage::notification(
                    "notifications/progress",
                    serde_json::to_value(&progress).unwrap_or_default(),
                );

                if let Some(ref tx) = session_tx {
                    // Convert to SSE event
                    let event_data = serde_json::to_string(&notification).unwrap_or_default();
                    let event = axum::response::sse::Event::default()
                        .event("message")
                        .data(event_data);

                    let _ = tx.send(Ok(event)).await;
                }
            }
        });
    }

    // A client only gets a sampler handle if it advertised sampling support
    // at initialize(); a session with no recorded capabilities (or none
    // this call's own dispatch hasn't seen yet) gets none.
    let sampler = state.sessions.get(session_id).and_then(|s| {
        let supports_sampling = s
            .client_capabilities
            .as_ref()
            .map(|c| c.sampling.is_some())
            .unwrap_or(false);
        supports_sampling
            .then(|| Sampler::new(state.sampling_client.clone(), state.sessions.clone(), session_id.to_string()))
    });

    let cancel = CancellationToken::new();
    let inflight_id = request.id.clone().map(|id| inflight_key(session_id, &id));
    if let Some(ref key) = inflight_id {
        state.inflight.insert(key.clone(), cancel.clone());
    }

    // Create tool context
    let context = ToolContext {
        session_id: session_id.to_string(),
        progress_token,
        progress_sender: progress_tx,
        sampler,
        cancel,
    };

    // Create child span for tool execution with MCP-specific attributes
    let tool_span = tracing::info_span!(
        "mcp.tool.call",
        mcp.tool.name = %params.name,
        mcp.session_id = %session_id,
        mcp.has_progress = %context.has_progress(),
    );

    let result = async {
        let result = state.handler.call_tool_with_context(&params.name, arguments, context).await?;

        serde_json::to_value(&result)
            .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
    }
    .instrument(tool_span)
    .await;

    if let Some(key) = inflight_id {
        state.inflight.remove(&key);
    }

    result
}

/// Run a task-capable tool in the background and return its freshly minted
/// `Task` descriptor immediately, per spec.md §4.3's task delegation rule.
async fn delegate_to_task<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
    tool_name: &str,
    arguments: Value,
) -> Result<Value, ErrorData> {
    let created_from_request_id = request.id.as_ref().map(|id| id.to_string()).unwrap_or_default();

    let task_id = state.tasks.create(TaskMeta {
        created_from_request_id,
        name: tool_name.to_string(),
        input: arguments.clone(),
    });

    let handler = state.handler.clone();
    let task_results = state.task_results.clone();
    let session_id = session_id.to_string();
    let tool_name = tool_name.to_string();
    let spawned_task_id = task_id.clone();

    tokio::spawn(async move {
        let context = ToolContext {
            session_id,
            progress_token: None,
            progress_sender: None,
            sampler: None,
            cancel: CancellationToken::new(),
        };

        match handler.call_tool_with_context(&tool_name, arguments, context).await {
            Ok(result) => {
                let value = serde_json::to_value(&result).unwrap_or(Value::Null);
                task_results.complete(&spawned_task_id, value).await;
            }
            Err(error) => task_results.fail(&spawned_task_id, error).await,
        }
    });

    let descriptor = state
        .tasks
        .describe(&task_id)
        .await
        .ok_or_else(|| ErrorData::internal_error("task vanished immediately after creation"))?;

    serde_json::to_value(Task::from(descriptor))
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize task: {}", e)))
}

async fn handle_list_resources<H: Handler>(state: &Arc<McpState<H>>) -> Result<Value, ErrorData> {
    let resources = state.handler.resources();
    let result = ListResourcesResult::all(resources);

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_list_resource_templates<H: Handler>(
    state: &Arc<McpState<H>>,
) -> Result<Value, ErrorData> {
    let templates = state.handler.resource_templates();
    let result = ListResourceTemplatesResult::all(templates);

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_read_resource<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    #[derive(serde::Deserialize)]
    struct Params {
        uri: String,
    }

    let params: Params = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid read params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing read params"))?;

    // Create child span for resource read with MCP-specific attributes
    let resource_span = tracing::info_span!(
        "mcp.resource.read",
        mcp.resource.uri = %params.uri,
    );

    async {
        let result = state.handler.read_resource(&params.uri).await?;

        serde_json::to_value(&result)
            .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
    }
    .instrument(resource_span)
    .await
}

async fn handle_list_prompts<H: Handler>(state: &Arc<McpState<H>>) -> Result<Value, ErrorData> {
    let prompts = state.handler.prompts();
    let result = ListPromptsResult::all(prompts);

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_subscribe<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: SubscribeParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid subscribe params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing subscribe params"))?;

    state.handler.subscribe_resource(&params.uri).await?;

    if let Some(mut session) = state.sessions.get_mut(session_id) {
        session.subscribe(&params.uri);
    }

    Ok(serde_json::json!({}))
}

async fn handle_unsubscribe<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: UnsubscribeParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid unsubscribe params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing unsubscribe params"))?;

    state.handler.unsubscribe_resource(&params.uri).await?;

    if let Some(mut session) = state.sessions.get_mut(session_id) {
        session.unsubscribe(&params.uri);
    }

    Ok(serde_json::json!({}))
}

async fn handle_set_level<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    #[derive(serde::Deserialize)]
    struct Params {
        level: LogLevel,
    }

    let params: Params = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid setLevel params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing setLevel params"))?;

    if let Some(mut session) = state.sessions.get_mut(session_id) {
        session.log_level = params.level;
    }

    state
        .logger
        .log(session_id, LogMessage::info(format!("log level set to {:?}", params.level)).with_logger("protomind"))
        .await;

    Ok(serde_json::json!({}))
}

async fn handle_complete<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CompleteParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid complete params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing complete params"))?;

    let result = state.handler.complete(params).await?;

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

async fn handle_get_prompt<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    #[derive(serde::Deserialize)]
    struct Params {
        name: String,
        #[serde(default)]
        arguments: Option<HashMap<String, String>>,
    }

    let params: Params = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid get params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing get params"))?;

    // Create child span for prompt get with MCP-specific attributes
    let prompt_span = tracing::info_span!(
        "mcp.prompt.get",
        mcp.prompt.name = %params.name,
    );

    async {
        let arguments = params.arguments.unwrap_or_default();
        let result = state.handler.get_prompt(&params.name, arguments).await?;

        serde_json::to_value(&result)
            .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
    }
    .instrument(prompt_span)
    .await
}

async fn handle_tasks_create<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CreateTaskParams = request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid tasks/create params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing tasks/create params"))?;

    let created_from_request_id = request.id.as_ref().map(|id| id.to_string()).unwrap_or_default();

    let task_id = state.tasks.create(TaskMeta {
        created_from_request_id,
        name: params.name,
        input: params.input,
    });

    task_response(state, &task_id).await
}

async fn handle_tasks_get<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params = task_id_params(request)?;
    task_response(state, &params.task_id).await
}

async fn handle_tasks_cancel<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params = task_id_params(request)?;

    if state.tasks.status(&params.task_id).await.is_none() {
        return Err(ErrorData::task_not_found(&params.task_id));
    }

    state.task_results.cancel(&params.task_id).await;
    task_response(state, &params.task_id).await
}

async fn handle_tasks_result<H: Handler>(
    state: &Arc<McpState<H>>,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params = task_id_params(request)?;

    let status = state
        .tasks
        .status(&params.task_id)
        .await
        .ok_or_else(|| ErrorData::task_not_found(&params.task_id))?;

    if !status.is_terminal() {
        return Err(ErrorData::invalid_request(format!(
            "Task {} has not completed yet (status: {:?})",
            params.task_id, status
        )));
    }

    let (result, error) = state.tasks.result(&params.task_id).await.unwrap_or((None, None));

    if let Some(error) = error {
        return Err(error);
    }

    let mut result = result.unwrap_or(Value::Null);
    if let Value::Object(ref mut map) = result {
        let related_task = RelatedTask { task_id: params.task_id };
        map.insert(
            "_meta".to_string(),
            serde_json::json!({ "relatedTask": related_task }),
        );
    }

    Ok(result)
}

async fn handle_tasks_list<H: Handler>(state: &Arc<McpState<H>>) -> Result<Value, ErrorData> {
    let tasks: Vec<Task> = state.tasks.list().await.into_iter().map(Task::from).collect();
    let result = ListTasksResult::all(tasks);

    serde_json::to_value(&result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

fn task_id_params(request: &JsonRpcMessage) -> Result<TaskIdParams, ErrorData> {
    request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid taskId params: {}", e)))?
        .ok_or_else(|| ErrorData::invalid_params("Missing taskId params"))
}

async fn task_response<H: Handler>(state: &Arc<McpState<H>>, task_id: &str) -> Result<Value, ErrorData> {
    let descriptor = state
        .tasks
        .describe(task_id)
        .await
        .ok_or_else(|| ErrorData::task_not_found(task_id))?;

    serde_json::to_value(Task::from(descriptor))
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize task: {}", e)))
}
