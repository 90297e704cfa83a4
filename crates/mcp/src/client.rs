//! HTTP tool invocation client.

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::{decode_body, extract_result};
use crate::error::{Error, Result};
use crate::protocol::{CallToolParams, JsonRpcRequest, RequestId};

/// Default timeout for a tool call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Path of the JSON-RPC endpoint under the server base URL.
pub const MCP_PATH: &str = "/mcp";

/// Something that can invoke a named tool and return its result payload.
pub trait ToolTransport: Send + Sync {
    /// Invoke `name` with `arguments`, returning the extracted result.
    fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Tool client speaking JSON-RPC over HTTP POST.
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicI64,
}

impl HttpClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:11435`).
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}{MCP_PATH}", base_url.as_ref().trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            next_id: AtomicI64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Build the `tools/call` envelope for one invocation.
    pub fn build_request(&self, name: &str, arguments: &Map<String, Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(self.next_request_id(), "tools/call").with_params(CallToolParams {
            name: name.to_string(),
            arguments: arguments.clone(),
        })
    }
}

impl ToolTransport for HttpClient {
    async fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        let request = self.build_request(name, arguments);
        let body = serde_json::to_string(&request)?;
        debug!(tool = name, endpoint = %self.endpoint, "calling tool");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match decode_body(&text) {
            Ok(envelope) => Ok(extract_result(envelope)),
            Err(_) if !status.is_success() => Err(Error::Status {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(e),
        }
    }
}
