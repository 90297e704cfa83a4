//! Raster error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open dataset {}: {reason}", path.display())]
    DatasetOpen { path: PathBuf, reason: String },

    #[error("operation requires at least {required} bands, dataset has {found}")]
    InsufficientBands { required: usize, found: usize },

    #[error("crop failed: {0}")]
    Translate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::DatasetOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
