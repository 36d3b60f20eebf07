//! Language model services.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::ServiceError;
use async_trait::async_trait;

/// Generates a completion for a single prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}
