//! Geoagent runtime: turns a free-text request into raster tool calls.
//!
//! # Overview
//!
//! - **ModelBackend**: a trait abstracting the completion model (Ollama).
//! - **ToolCallParser**: recovers `TOOL_NEEDED:` / `PARAMS:` pairs from the
//!   model's text.
//! - **ToolRegistry**: the closed set of tools that may be invoked.
//! - **Orchestrator**: runs the calls in order over a [`mcp::ToolTransport`]
//!   and reports each outcome independently.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use mcp::HttpClient;
//! use runtime::{OllamaBackend, Orchestrator, ToolRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = OllamaBackend::builder("http://127.0.0.1:11434", "phi3").build()?;
//! let transport = HttpClient::new("http://127.0.0.1:11435", Duration::from_secs(60))?;
//! let orchestrator = Orchestrator::new(model, transport, ToolRegistry::raster());
//!
//! for report in orchestrator.handle("get the DEM value of dem.tif at 10, 20").await? {
//!     println!("{report}");
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod orchestrator;
pub mod parser;
mod prompt;
mod registry;

pub use backend::{DEFAULT_BASE_URL, DEFAULT_MODEL, ModelBackend, OllamaBackend, OllamaBackendBuilder};
pub use error::{ArgumentParseError, Error, Result};
pub use orchestrator::{Orchestrator, Report};
pub use parser::{ParseOutcome, ToolCall, ToolCallParser};
pub use prompt::build_prompt;
pub use registry::{ToolRegistry, ToolSpec};
