//! Server Façade
//!
//! `Handler` (`protocol/mod.rs`) is the low-level seam: implement it
//! directly for a handler struct with hand-written `tools()`/`call_tool()`
//! methods. `Server` is an additive alternative for hosts that would rather
//! register tools, resources, and prompts as individual closures than write
//! one big `Handler` impl.
//!
//! `Handler` itself remains directly implementable; nothing here changes
//! that contract.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::{Handler, ToolContext};
use crate::types::error::ErrorData;
use crate::types::prompt::{GetPromptResult, Prompt};
use crate::types::protocol::{Implementation, ServerCapabilities};
use crate::types::resource::{ReadResourceResult, Resource, ResourceTemplate};
use crate::types::tool::{CallToolResult, Tool};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type ToolFn = Arc<dyn Fn(Value, ToolContext) -> BoxFuture<'static, Result<CallToolResult, ErrorData>> + Send + Sync>;
type ResourceFn = Arc<dyn Fn(String) -> BoxFuture<'static, Result<ReadResourceResult, ErrorData>> + Send + Sync>;
type PromptFn = Arc<dyn Fn(HashMap<String, String>) -> BoxFuture<'static, Result<GetPromptResult, ErrorData>> + Send + Sync>;

/// Registered tools: definition plus the closure that executes a call.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    entries: Vec<(Tool, ToolFn)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool and the closure that executes calls to it.
    pub fn register<F, Fut>(mut self, tool: Tool, handler: F) -> Self
    where
        F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ErrorData>> + Send + 'static,
    {
        let boxed: ToolFn = Arc::new(move |args, ctx| Box::pin(handler(args, ctx)));
        self.entries.push((tool, boxed));
        self
    }

    fn definitions(&self) -> Vec<Tool> {
        self.entries.iter().map(|(t, _)| t.clone()).collect()
    }

    async fn call(&self, name: &str, args: Value, ctx: ToolContext) -> Result<CallToolResult, ErrorData> {
        let (tool, handler) = self
            .entries
            .iter()
            .find(|(t, _)| t.name == name)
            .ok_or_else(|| ErrorData::tool_not_found(name))?;

        crate::schema::SchemaNode::from(&tool.input_schema)
            .validate(&args)
            .map_err(|e| ErrorData::invalid_params(e.to_invalid_params_message()))?;

        handler(args, ctx).await
    }
}

/// Registered resources: either static definitions with a shared reader, or
/// individually-closured readers, keyed by URI.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    entries: Vec<(Resource, ResourceFn)>,
    templates: Vec<ResourceTemplate>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(mut self, resource: Resource, reader: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReadResourceResult, ErrorData>> + Send + 'static,
    {
        let boxed: ResourceFn = Arc::new(move |uri| Box::pin(reader(uri)));
        self.entries.push((resource, boxed));
        self
    }

    pub fn with_template(mut self, template: ResourceTemplate) -> Self {
        self.templates.push(template);
        self
    }

    fn definitions(&self) -> Vec<Resource> {
        self.entries.iter().map(|(r, _)| r.clone()).collect()
    }

    async fn read(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        let (_, reader) = self
            .entries
            .iter()
            .find(|(r, _)| r.uri == uri)
            .ok_or_else(|| ErrorData::resource_not_found(uri))?;
        reader(uri.to_string()).await
    }
}

/// Registered prompts, keyed by name.
#[derive(Default, Clone)]
pub struct PromptRegistry {
    entries: Vec<(Prompt, PromptFn)>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(mut self, prompt: Prompt, handler: F) -> Self
    where
        F: Fn(HashMap<String, String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult, ErrorData>> + Send + 'static,
    {
        let boxed: PromptFn = Arc::new(move |args| Box::pin(handler(args)));
        self.entries.push((prompt, boxed));
        self
    }

    fn definitions(&self) -> Vec<Prompt> {
        self.entries.iter().map(|(p, _)| p.clone()).collect()
    }

    async fn get(&self, name: &str, args: HashMap<String, String>) -> Result<GetPromptResult, ErrorData> {
        let (_, handler) = self
            .entries
            .iter()
            .find(|(p, _)| p.name == name)
            .ok_or_else(|| ErrorData::prompt_not_found(name))?;
        handler(args).await
    }
}

/// A `Handler` built entirely from registries instead of a hand-written
/// impl.
pub struct Server {
    server_info: Implementation,
    instructions: Option<String>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
}

impl Server {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            server_info: Implementation::new(name, version),
            instructions: None,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
            prompts: PromptRegistry::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_resources(mut self, resources: ResourceRegistry) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptRegistry) -> Self {
        self.prompts = prompts;
        self
    }
}

#[async_trait]
impl Handler for Server {
    fn tools(&self) -> Vec<Tool> {
        self.tools.definitions()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData> {
        self.call_tool_with_context(name, arguments, ToolContext {
            session_id: String::new(),
            progress_token: None,
            progress_sender: None,
            sampler: None,
            cancel: tokio_util::sync::CancellationToken::new(),
        })
        .await
    }

    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: Value,
        context: ToolContext,
    ) -> Result<CallToolResult, ErrorData> {
        self.tools.call(name, arguments, context).await
    }

    fn server_info(&self) -> Implementation {
        self.server_info.clone()
    }

    fn resources(&self) -> Vec<Resource> {
        self.resources.definitions()
    }

    fn resource_templates(&self) -> Vec<ResourceTemplate> {
        self.resources.templates.clone()
    }

    async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        self.resources.read(uri).await
    }

    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.definitions()
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, ErrorData> {
        self.prompts.get(name, arguments).await
    }

    fn instructions(&self) -> Option<String> {
        self.instructions.clone()
    }

    fn capabilities(&self) -> ServerCapabilities {
        let mut caps = ServerCapabilities::default().enable_tools().enable_logging();

        if !self.resources.entries.is_empty() || !self.resources.templates.is_empty() {
            caps = caps.enable_resources();
        }

        if !self.prompts.entries.is_empty() {
            caps = caps.enable_prompts();
        }

        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content::Content;

    #[tokio::test]
    async fn test_server_dispatches_registered_tool() {
        let tools = ToolRegistry::new().register(Tool::new("echo", "Echo input"), |args, _ctx| async move {
            Ok(CallToolResult::success(vec![Content::text(args["text"].as_str().unwrap_or(""))]))
        });

        let server = Server::new("test-server", "0.1.0").with_tools(tools);

        let result = server.call_tool("echo", serde_json::json!({"text": "hi"})).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("hi"));
    }

    #[tokio::test]
    async fn test_unregistered_tool_not_found() {
        let server = Server::new("test-server", "0.1.0");
        let result = server.call_tool("missing", serde_json::json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_server_reads_registered_resource() {
        use crate::types::resource::ResourceContents;

        let resources = ResourceRegistry::new().register(
            Resource::new("mem://greeting", "greeting"),
            |uri| async move { Ok(ReadResourceResult::single(ResourceContents::text(uri, "hello"))) },
        );

        let server = Server::new("test-server", "0.1.0").with_resources(resources);
        let result = server.read_resource("mem://greeting").await.unwrap();
        assert_eq!(result.contents.len(), 1);
    }

    #[test]
    fn test_capabilities_reflect_registered_registries() {
        let tools = ToolRegistry::new().register(Tool::new("noop", "no-op"), |_args, _ctx| async move {
            Ok(CallToolResult::text("ok"))
        });
        let server = Server::new("test-server", "0.1.0").with_tools(tools);

        let caps = server.capabilities();
        assert!(caps.tools.is_some());
        assert!(caps.resources.is_none());
        assert!(caps.logging.is_some());
    }
}
