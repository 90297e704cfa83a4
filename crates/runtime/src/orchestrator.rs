//! Request orchestration: model text to tool results.

use std::fmt;

use mcp::ToolTransport;
use serde_json::Value;
use tracing::{info, warn};

use crate::Result;
use crate::backend::ModelBackend;
use crate::error::ArgumentParseError;
use crate::parser::ToolCallParser;
use crate::prompt::build_prompt;
use crate::registry::ToolRegistry;

/// Outcome of one parsed call, or the model's plain answer.
#[derive(Debug)]
pub enum Report {
    /// The model requested no tools.
    Answer(String),
    ToolResult { name: String, result: Value },
    UnknownTool { name: String },
    /// A `PARAMS:` line that was skipped because it was not a JSON object.
    MalformedParams(ArgumentParseError),
    /// The call could not be delivered or its response not decoded.
    Failed { name: String, error: mcp::Error },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answer(text) => write!(f, "{text}"),
            Self::ToolResult { name, result } => write!(f, "{name} result: {result:#}"),
            Self::UnknownTool { name } => write!(f, "unknown or unavailable tool: {name}"),
            Self::MalformedParams(error) => write!(f, "malformed PARAMS on {error}"),
            Self::Failed { name, error } => write!(f, "{name} failed: {error}"),
        }
    }
}

/// Drives one request at a time through model, parser and tool transport.
pub struct Orchestrator<M, T> {
    model: M,
    transport: T,
    registry: ToolRegistry,
}

impl<M: ModelBackend, T: ToolTransport> Orchestrator<M, T> {
    pub fn new(model: M, transport: T, registry: ToolRegistry) -> Self {
        Self {
            model,
            transport,
            registry,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one user request.
    ///
    /// Skipped `PARAMS:` lines are reported first, in line order. Calls then
    /// run sequentially in parse order. A failing call is reported and the
    /// remaining calls still run; only a model failure returns `Err`.
    pub async fn handle(&self, request: &str) -> Result<Vec<Report>> {
        let prompt = build_prompt(&self.registry, request);
        let text = self.model.complete(&prompt).await?;
        let outcome = ToolCallParser::parse(&text);

        let mut reports: Vec<Report> = outcome
            .skipped
            .into_iter()
            .map(Report::MalformedParams)
            .collect();

        if outcome.calls.is_empty() {
            reports.push(Report::Answer(text));
            return Ok(reports);
        }

        reports.reserve(outcome.calls.len());
        for call in outcome.calls {
            if !self.registry.contains(&call.name) {
                warn!(tool = %call.name, "model requested an unregistered tool");
                reports.push(Report::UnknownTool { name: call.name });
                continue;
            }

            info!(tool = %call.name, "calling tool");
            let report = match self.transport.call_tool(&call.name, &call.arguments).await {
                Ok(result) => Report::ToolResult {
                    name: call.name,
                    result,
                },
                Err(error) => {
                    warn!(tool = %call.name, "tool call failed: {error}");
                    Report::Failed {
                        name: call.name,
                        error,
                    }
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }
}
