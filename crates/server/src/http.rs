//! JSON-RPC endpoint served over HTTP.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use mcp::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, MCP_PATH, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, ToolsCapability,
    encode_event,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::tools::ToolRouter;

const SERVER_NAME: &str = "geoagent";
const EVENT_STREAM: &str = "text/event-stream";
const INSTRUCTIONS: &str = "This server analyzes TIFF or JP2 rasters, crops them by coordinates \
    and converts them to PNG. It also computes mean and point NDVI, and elevation from DEMs.";

/// Build the router exposing `POST /mcp`.
pub fn app(tools: Arc<ToolRouter>) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_rpc))
        .with_state(tools)
}

/// Serve the tool endpoint on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    tools: Arc<ToolRouter>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "tool service listening");
    axum::serve(listener, app(tools))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("tool service stopped");
    Ok(())
}

async fn handle_rpc(
    State(tools): State<Arc<ToolRouter>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let wants_events = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(EVENT_STREAM));

    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("malformed request body: {e}");
            let error = JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("parse error: {e}"));
            return respond(JsonRpcResponse::failure(None, error), wants_events);
        }
    };

    if request.is_notification() {
        debug!(method = %request.method, "notification received");
        return StatusCode::ACCEPTED.into_response();
    }

    let id = request.id.clone();
    let response = match dispatch(&tools, request).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    };
    respond(response, wants_events)
}

async fn dispatch(
    tools: &Arc<ToolRouter>,
    request: JsonRpcRequest,
) -> std::result::Result<Value, JsonRpcError> {
    debug!(method = %request.method, "request received");
    match request.method.as_str() {
        "initialize" => to_result(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }),
        "ping" => Ok(json!({})),
        "tools/list" => to_result(ListToolsResult {
            tools: tools.tools(),
        }),
        "tools/call" => {
            let params: CallToolParams =
                serde_json::from_value(request.params.unwrap_or(Value::Null)).map_err(|e| {
                    JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("invalid params: {e}"))
                })?;
            let tools = Arc::clone(tools);
            let result = tokio::task::spawn_blocking(move || tools.call(&params.name, params.arguments))
                .await
                .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))?;
            to_result(result)
        }
        other => Err(JsonRpcError::new(
            JsonRpcError::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    }
}

fn to_result(value: impl serde::Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}

fn respond(response: JsonRpcResponse, wants_events: bool) -> Response {
    if !wants_events {
        return Json(response).into_response();
    }
    match serde_json::to_value(&response) {
        Ok(value) => ([(CONTENT_TYPE, EVENT_STREAM)], encode_event(&value)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
