//! MCP (Model Context Protocol) tool invocation over HTTP.
//!
//! This crate provides the JSON-RPC envelope types shared by the geoagent
//! client and tool server, decoding of both response framings (bare JSON and
//! event-stream), and an HTTP client implementing [`ToolTransport`].
//!
//! # Example
//!
//! ```no_run
//! use mcp::{DEFAULT_TIMEOUT, HttpClient, ToolTransport};
//! use serde_json::{Map, json};
//!
//! # async fn example() -> mcp::Result<()> {
//! let client = HttpClient::new("http://127.0.0.1:11435", DEFAULT_TIMEOUT)?;
//!
//! let mut arguments = Map::new();
//! arguments.insert("filepath".into(), json!("scene.tif"));
//!
//! let result = client.call_tool("analyze_tiff", &arguments).await?;
//! println!("{result:#}");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod envelope;
mod error;
mod protocol;

pub use client::{DEFAULT_TIMEOUT, HttpClient, MCP_PATH, ToolTransport};
pub use envelope::{decode_body, encode_event, extract_result};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JSONRPC_VERSION, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolContent, ToolsCapability,
};
