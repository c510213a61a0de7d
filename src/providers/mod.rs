use std::future::Future;
use std::pin::Pin;

use crate::credential::Credential;

mod classify;
mod gemini;

pub use gemini::{DEFAULT_MODEL, Gemini};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerateError {
    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Invalid API key: {0}")]
    Unauthorized(String),
    #[error("Generation failed: {0}")]
    Failed(String),
}

pub type GenerateFuture = Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send>>;

/// A remote text generator. Each call carries its own credential; nothing is
/// retried and nothing is kept between calls.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str, credential: &Credential) -> GenerateFuture;
}
