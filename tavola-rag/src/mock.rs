//! Mock collaborators for tests and offline use.
//!
//! [`HashEmbedder`] is a deterministic bag-of-words embedder: the same
//! text always produces the same vector, and vectors for texts sharing
//! vocabulary land near each other. It is no substitute for a real
//! sentence encoder, but it makes builds reproducible without model
//! downloads and keeps retrieval tests meaningful.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generation::Generator;

/// Deterministic token-hash embedder.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create an embedder producing vectors of the given width.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// A generator that always returns the same canned text.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
    response: String,
}

impl StaticGenerator {
    /// Create a generator returning `response` for every prompt.
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}

/// A generator that echoes the prompt back, for inspecting prompt assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

/// A model-free generator that answers with the retrieved context.
///
/// Parses the engine's prompt shape (`Context: …\n\nQuestion: …\nAnswer:`)
/// and returns the context portion as the answer, so a knowledge base is
/// usable end to end without a generation model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let context = prompt
            .strip_prefix("Context: ")
            .and_then(|rest| rest.split("\n\nQuestion:").next())
            .unwrap_or(prompt);
        Ok(format!("Answer: {context}"))
    }
}

/// An embedder that always fails, for exercising error paths.
#[derive(Debug, Clone, Copy)]
pub struct FailingEmbedder {
    dimension: usize,
}

impl FailingEmbedder {
    /// Create a failing embedder reporting the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::CollaboratorFailure {
            collaborator: "embedder".to_string(),
            message: "synthetic embedding failure".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// A generator that always fails, for exercising error paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::CollaboratorFailure {
            collaborator: "generator".to_string(),
            message: "synthetic generation failure".to_string(),
        })
    }
}
