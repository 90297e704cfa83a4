//! Tool service error types.

use thiserror::Error;

/// Errors from serving the tool endpoint.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single tool call, reported to the caller as a value.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Raster(#[from] raster::Error),

    #[error("tool execution aborted: {0}")]
    Aborted(String),
}

