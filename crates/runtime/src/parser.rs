//! Tool call extraction from model text.
//!
//! The model is asked to answer with pairs of lines:
//!
//! ```text
//! TOOL_NEEDED: get_dem
//! PARAMS: {"filepath": "dem.tif", "x": 1.0, "y": 2.0}
//! ```
//!
//! Anything else is ignored. A malformed `PARAMS:` line is skipped while the
//! pending tool name is kept, so a later well-formed line can still complete
//! the call. A second `TOOL_NEEDED:` line before any `PARAMS:` replaces the
//! pending name.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ArgumentParseError;

pub const TOOL_MARKER: &str = "TOOL_NEEDED:";
pub const PARAMS_MARKER: &str = "PARAMS:";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Calls extracted from one model response, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub calls: Vec<ToolCall>,
    pub skipped: Vec<ArgumentParseError>,
}

#[derive(Debug)]
enum State {
    AwaitingToolName,
    AwaitingParams { name: String },
}

/// Two-state line parser for `TOOL_NEEDED:` / `PARAMS:` pairs.
#[derive(Debug)]
pub struct ToolCallParser {
    state: State,
    outcome: ParseOutcome,
}

impl Default for ToolCallParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCallParser {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingToolName,
            outcome: ParseOutcome::default(),
        }
    }

    /// Parse a complete model response.
    pub fn parse(text: &str) -> ParseOutcome {
        let mut parser = Self::new();
        for (index, line) in text.lines().enumerate() {
            parser.feed(index + 1, line);
        }
        parser.finish()
    }

    /// Consume one line. `number` is only used for diagnostics.
    pub fn feed(&mut self, number: usize, line: &str) {
        if let Some(rest) = line.strip_prefix(TOOL_MARKER) {
            let name = rest.trim().trim_matches(',');
            if let State::AwaitingParams { name: previous } = &self.state {
                debug!(previous = %previous, next = name, "tool name replaced before params");
            }
            // An empty name clears any pending one.
            self.state = if name.is_empty() {
                State::AwaitingToolName
            } else {
                State::AwaitingParams {
                    name: name.to_string(),
                }
            };
        } else if let Some(rest) = line.strip_prefix(PARAMS_MARKER) {
            let arguments = match serde_json::from_str::<Map<String, Value>>(rest.trim()) {
                Ok(arguments) => arguments,
                Err(e) => {
                    let error = ArgumentParseError {
                        line: number,
                        reason: e.to_string(),
                    };
                    warn!("skipping PARAMS {error}");
                    self.outcome.skipped.push(error);
                    return;
                }
            };
            match std::mem::replace(&mut self.state, State::AwaitingToolName) {
                State::AwaitingParams { name } => {
                    self.outcome.calls.push(ToolCall { name, arguments });
                }
                State::AwaitingToolName => {
                    debug!(line = number, "PARAMS without a tool name ignored");
                }
            }
        }
    }

    pub fn finish(self) -> ParseOutcome {
        if let State::AwaitingParams { name } = &self.state {
            debug!(tool = %name, "tool name without params at end of text");
        }
        self.outcome
    }
}
