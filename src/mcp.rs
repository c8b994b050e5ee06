//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] and the [`DocsIndex`] to the MCP server
//! protocol:
//!
//! * **Tools**: the catalog tools via `list_tools` / `call_tool`.
//! * **Resources**: every indexed page as a concrete resource, plus the
//!   `feathers-doc://docs/{path}` template, served via `read_resource`.
//!
//! The bridge is transport-agnostic; [`serve_stdio`] runs it over
//! stdin/stdout and [`crate::server`] mounts it on the HTTP router.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::error::DocsError;
use crate::index::{DocsIndex, MARKDOWN_MIME};
use crate::tools::{ToolContext, ToolRegistry};
use crate::uri::URI_TEMPLATE;

/// Bridges the catalog to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct (everything is behind
/// `Arc`), so all sessions share the same index.
#[derive(Clone)]
pub struct McpBridge {
    index: Arc<DocsIndex>,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(index: Arc<DocsIndex>, tools: Arc<ToolRegistry>) -> Self {
        Self { index, tools }
    }

    /// Convert a catalog tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::tools::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };
        let read_only = tool.name() != "refresh_docs";

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(read_only)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn page_template() -> Result<ResourceTemplate, McpError> {
        serde_json::from_value(serde_json::json!({
            "uriTemplate": URI_TEMPLATE,
            "name": "docs-page",
            "description": "Markdown page addressed by its path under the docs root",
            "mimeType": MARKDOWN_MIME,
        }))
        .map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

/// Maps catalog errors to JSON-RPC errors.
fn to_mcp_error(err: DocsError) -> McpError {
    match err {
        DocsError::NotFound(_) => McpError::resource_not_found(err.to_string(), None),
        e if e.is_client_error() => McpError::invalid_params(e.to_string(), None),
        e => McpError::internal_error(e.to_string(), None),
    }
}

/// Renders a tool result as pretty JSON text.
fn tool_output<T: serde::Serialize + ?Sized>(result: &T) -> CallToolResult {
    match serde_json::to_string_pretty(result) {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!(
            "failed to serialize tool result: {}",
            e
        ))]),
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "feathers-docs".to_string(),
                title: Some("Feathers Docs".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only catalog of the Feathers documentation. Use list_docs to browse or \
                 filter pages, read_doc with a feathers-doc://docs/ uri to fetch a page, \
                 docs_status to check sync health, and refresh_docs to pull the latest docs."
                    .to_string(),
            ),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let ctx = ToolContext::new(self.index.clone());
        match tool.execute(params, &ctx).await {
            Ok(result) => Ok(tool_output(&result)),
            Err(e) => match e.downcast::<DocsError>() {
                Ok(docs_err) if docs_err.is_client_error() => {
                    Err(McpError::invalid_params(docs_err.to_string(), None))
                }
                Ok(docs_err) => Ok(CallToolResult::error(vec![Content::text(
                    docs_err.to_string(),
                )])),
                Err(other) => Ok(CallToolResult::error(vec![Content::text(other.to_string())])),
            },
        }
    }

    // ── Resources ────────────────────────────────────────────────────────

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let snapshot = self.index.snapshot();
        let resources: Vec<Resource> = snapshot
            .pages
            .iter()
            .map(|page| {
                let mut raw = RawResource::new(page.uri.clone(), page.title.clone());
                raw.description = Some(page.relative_path.clone());
                raw.mime_type = Some(MARKDOWN_MIME.to_string());
                raw.no_annotation()
            })
            .collect();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        let result =
            Self::page_template().map(|t| ListResourceTemplatesResult::with_all_items(vec![t]));
        std::future::ready(result)
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let resource = self
            .index
            .resource_by_uri(&request.uri)
            .await
            .map_err(to_mcp_error)?;

        serde_json::from_value(serde_json::json!({
            "contents": [{
                "uri": resource.uri,
                "mimeType": resource.mime_type,
                "text": resource.text,
            }]
        }))
        .map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

/// Serves the MCP protocol over stdin/stdout until the client disconnects.
pub async fn serve_stdio(index: Arc<DocsIndex>) -> anyhow::Result<()> {
    tracing::info!("feathers-docs MCP server starting on stdio");

    let bridge = McpBridge::new(index, Arc::new(ToolRegistry::with_builtins()));
    let service = bridge.serve(rmcp::transport::stdio()).await?;
    let reason = service.waiting().await?;

    tracing::info!(?reason, "feathers-docs MCP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_template_shape() {
        let template = McpBridge::page_template().unwrap();
        let json = serde_json::to_value(&template).unwrap();
        assert_eq!(json["uriTemplate"], URI_TEMPLATE);
        assert_eq!(json["mimeType"], MARKDOWN_MIME);
    }

    #[test]
    fn test_tool_descriptor_annotations() {
        let registry = ToolRegistry::with_builtins();
        let list = McpBridge::to_mcp_tool(registry.find("list_docs").unwrap());
        assert_eq!(list.name, "list_docs");
        assert_eq!(list.input_schema.get("type").unwrap(), "object");
        let refresh = McpBridge::to_mcp_tool(registry.find("refresh_docs").unwrap());
        assert_eq!(
            refresh.annotations.and_then(|a| a.read_only_hint),
            Some(false)
        );
    }

    #[test]
    fn test_tool_output_success_is_pretty_json() {
        let out = tool_output(&serde_json::json!({"ok": true}));
        assert_eq!(out.is_error, Some(false));
        let json = serde_json::to_value(&out).unwrap();
        let text = json["content"][0]["text"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(text).unwrap()["ok"],
            true
        );
    }

    #[test]
    fn test_tool_output_serialize_failure_is_error() {
        // Non-string map keys cannot become JSON object keys.
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1);
        let out = tool_output(&map);
        assert_eq!(out.is_error, Some(true));
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("failed to serialize tool result"));
    }

    #[test]
    fn test_error_mapping() {
        let err = to_mcp_error(DocsError::PathTraversal("..".into()));
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        let err = to_mcp_error(DocsError::NotFound("x".into()));
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
    }
}
