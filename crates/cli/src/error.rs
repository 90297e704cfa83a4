//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The metadata database does not exist.
    ///
    /// This typically means no raster has been analyzed yet.
    #[error("database not found at {path}. Run 'geoagent serve' and analyze a raster first")]
    DatabaseNotFound { path: PathBuf },

    /// Configuration could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The tool client could not be constructed.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// The tool service failed.
    #[error(transparent)]
    Server(#[from] server::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
