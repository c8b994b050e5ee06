//! HTTP server.
//!
//! Serves the catalog over two surfaces on one listener:
//!
//! * the MCP streamable HTTP transport, mounted at `/mcp`;
//! * a plain JSON API that dispatches through the same [`ToolRegistry`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `*`    | `/mcp` | MCP streamable HTTP transport |
//! | `GET`  | `/tools/list` | List all tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/docs/{*path}` | Page content for `feathers-doc://docs/{path}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid argument: limit must be between 1 and 20, got 0" } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `read_error` (500), `sync_error` (502), `internal` (500), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::DocsError;
use crate::index::DocsIndex;
use crate::mcp::McpBridge;
use crate::models::ResourceResult;
use crate::tools::{ToolContext, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    index: Arc<DocsIndex>,
    tools: Arc<ToolRegistry>,
}

/// Builds the full router: JSON API plus the MCP transport at `/mcp`.
pub fn router(index: Arc<DocsIndex>) -> Router {
    let tools = Arc::new(ToolRegistry::with_builtins());
    let bridge = McpBridge::new(index.clone(), tools.clone());

    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/docs/{*path}", get(handle_doc))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(AppState { index, tools })
}

/// Binds `bind` and serves until the process is terminated.
///
/// The index should already hold its initial snapshot.
pub async fn serve_http(index: Arc<DocsIndex>, bind: &str) -> anyhow::Result<()> {
    let app = router(index);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        "feathers-docs listening on http://{} (MCP at /mcp)",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DocsError> for AppError {
    fn from(err: DocsError) -> Self {
        let status = match &err {
            DocsError::InvalidArgument(_) | DocsError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            DocsError::PathTraversal(_) => StatusCode::FORBIDDEN,
            DocsError::NotFound(_) => StatusCode::NOT_FOUND,
            DocsError::Read { .. } | DocsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DocsError::Sync(_) => StatusCode::BAD_GATEWAY,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Catalog errors keep their own status; anything else is a 500.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    match err.downcast::<DocsError>() {
        Ok(docs_err) => docs_err.into(),
        Err(other) => AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "tool_error".to_string(),
            message: format!("{}: {}", tool_name, other),
        },
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

/// One entry of `GET /tools/list`.
#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch.
///
/// Returns `404` for an unknown tool and the catalog error's own status for
/// failures raised by the tool.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let ctx = ToolContext::new(state.index.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

// ============ GET /docs/{*path} ============

/// Templated resource: `path` arrives percent-decoded from the route.
async fn handle_doc(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<ResourceResult>, AppError> {
    let resource = state.index.resource(&path).await?;
    Ok(Json(resource))
}
