//! Text generation collaborator trait.

use async_trait::async_trait;

use crate::error::Result;

/// A collaborator that completes a prompt with generated text.
///
/// Latency is arbitrary and output is not guaranteed deterministic; the
/// engine invokes it synchronously and performs no retries.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
