//! Model backend abstraction.
//!
//! The orchestrator only needs plain completion: one prompt in, the raw model
//! text out. Tool calls are recovered from that text by the parser.

mod ollama;

pub use ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaBackend, OllamaBackendBuilder};

use crate::Result;
use std::future::Future;

/// Trait for model backends.
pub trait ModelBackend: Send + Sync {
    /// Send a single-turn prompt and return the model's text.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}
