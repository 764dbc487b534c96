//! Embedding collaborator trait.

use async_trait::async_trait;

use crate::error::Result;

/// A collaborator that turns text into fixed-width numeric vectors.
///
/// Implementations wrap a concrete embedding model behind a unified
/// async interface. The model must be deterministic for identical text
/// and configuration, and its dimension is fixed for the lifetime of one
/// store. The default [`embed_batch`](Embedder::embed_batch) calls
/// [`embed`](Embedder::embed) sequentially, which preserves input order;
/// backends with native batching should override it, keeping vector `i`
/// aligned with text `i`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this embedder.
    fn dimension(&self) -> usize;
}
