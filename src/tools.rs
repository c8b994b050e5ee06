//! Catalog tools and the registry both transports dispatch through.
//!
//! Each catalog operation is a [`Tool`] with a JSON schema and an async
//! `execute`. Raw JSON arguments are validated here, once, and turned into
//! the typed arguments the index accepts; the MCP bridge and the HTTP API
//! share this code so both surfaces behave identically.
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `list_docs` | [`DocsIndex::list`] |
//! | `read_doc` | [`DocsIndex::read`] |
//! | `refresh_docs` | [`DocsIndex::refresh`] |
//! | `docs_status` | [`DocsIndex::status`] |

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::MAX_PAGE_SIZE;
use crate::error::DocsError;
use crate::index::{DocsIndex, ListQuery};
use crate::uri::URI_PREFIX;

/// A catalog operation exposed to clients.
///
/// Errors returned from [`execute`](Tool::execute) that originate in the
/// catalog are [`DocsError`]s wrapped in `anyhow`; transports downcast them
/// to pick a status or error code.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route and MCP tool name.
    fn name(&self) -> &str;

    /// One-line description for discovery.
    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments.
    fn parameters_schema(&self) -> Value;

    /// Validates `params` and runs the operation.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Handle to the live index, passed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    index: Arc<DocsIndex>,
}

impl ToolContext {
    pub fn new(index: Arc<DocsIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &DocsIndex {
        &self.index
    }
}

/// Raw `list_docs` arguments, checked into a [`ListQuery`].
#[derive(Debug, Default)]
pub struct ListArgs {
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListArgs {
    /// Extracts arguments from a JSON object, rejecting wrong types.
    pub fn from_json(params: &Value) -> Result<Self, DocsError> {
        let params = as_object(params)?;
        Ok(Self {
            query: optional_string(&params, "query")?,
            limit: optional_integer(&params, "limit")?,
            offset: optional_integer(&params, "offset")?,
        })
    }

    /// Applies range checks and defaults.
    pub fn validate(self, default_limit: usize) -> Result<ListQuery, DocsError> {
        ListQuery::new(self.query, self.limit, self.offset, default_limit)
    }
}

fn as_object(params: &Value) -> Result<serde_json::Map<String, Value>, DocsError> {
    match params {
        Value::Null => Ok(serde_json::Map::new()),
        Value::Object(map) => Ok(map.clone()),
        other => Err(DocsError::InvalidArgument(format!(
            "arguments must be an object, got {}",
            other
        ))),
    }
}

fn optional_string(
    params: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<String>, DocsError> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DocsError::InvalidArgument(format!(
            "{} must be a string, got {}",
            field, other
        ))),
    }
}

fn optional_integer(
    params: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<i64>, DocsError> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            DocsError::InvalidArgument(format!("{} must be an integer, got {}", field, n))
        }),
        Some(other) => Err(DocsError::InvalidArgument(format!(
            "{} must be an integer, got {}",
            field, other
        ))),
    }
}

fn optional_bool(
    params: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<bool>, DocsError> {
    match params.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(DocsError::InvalidArgument(format!(
            "{} must be a boolean, got {}",
            field, other
        ))),
    }
}

/// `list_docs`: filter, paginate, and group indexed pages.
pub struct ListDocsTool;

#[async_trait]
impl Tool for ListDocsTool {
    fn name(&self) -> &str {
        "list_docs"
    }

    fn description(&self) -> &str {
        "List documentation pages with optional substring filter, pagination, and folder groups"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Case-insensitive substring matched against title, path, and headings"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_PAGE_SIZE,
                    "description": "Page size"
                },
                "offset": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Number of matches to skip"
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = ListArgs::from_json(&params)?.validate(ctx.index().config().top_k())?;
        let result = ctx.index().list(&query);
        Ok(serde_json::to_value(&result)?)
    }
}

/// `read_doc`: raw markdown of one page, read fresh from disk.
pub struct ReadDocTool;

#[async_trait]
impl Tool for ReadDocTool {
    fn name(&self) -> &str {
        "read_doc"
    }

    fn description(&self) -> &str {
        "Read the markdown content of a documentation page by its feathers-doc:// uri"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "uri": {
                    "type": "string",
                    "description": format!("Page identifier, starting with {}", URI_PREFIX)
                }
            },
            "required": ["uri"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params = as_object(&params)?;
        let uri = optional_string(&params, "uri")?
            .ok_or_else(|| DocsError::InvalidArgument("uri is required".to_string()))?;
        let result = ctx.index().read(&uri).await?;
        Ok(serde_json::to_value(&result)?)
    }
}

/// `refresh_docs`: re-sync the repository and rebuild the index.
pub struct RefreshDocsTool;

#[async_trait]
impl Tool for RefreshDocsTool {
    fn name(&self) -> &str {
        "refresh_docs"
    }

    fn description(&self) -> &str {
        "Fetch the latest docs from the repository and rebuild the index"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "forceRebuild": {
                    "type": "boolean",
                    "description": "Advisory; every refresh rebuilds the full index"
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let params = as_object(&params)?;
        let force_rebuild = optional_bool(&params, "forceRebuild")?.unwrap_or(false);
        let result = ctx.index().refresh(force_rebuild).await?;
        Ok(serde_json::to_value(&result)?)
    }
}

/// `docs_status`: sync metadata and index health.
pub struct DocsStatusTool;

#[async_trait]
impl Tool for DocsStatusTool {
    fn name(&self) -> &str {
        "docs_status"
    }

    fn description(&self) -> &str {
        "Report repository, sync, and index status"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(serde_json::to_value(ctx.index().status())?)
    }
}

/// Ordered set of tools served by the MCP bridge and the HTTP API.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding the four catalog tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ListDocsTool));
        registry.register(Box::new(ReadDocTool));
        registry.register(Box::new(RefreshDocsTool));
        registry.register(Box::new(DocsStatusTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
