//! Configuration for the retrieval engine.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for a [`RetrievalEngine`](crate::RetrievalEngine).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Number of documents retrieved into the generation context.
    pub top_k: usize,
    /// Fixed response returned when the corpus holds no documents.
    pub empty_corpus_response: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            empty_corpus_response: "I don't have any restaurant information to answer that."
                .to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new builder for constructing an [`EngineConfig`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the number of documents retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the fixed response used when the corpus is empty.
    pub fn empty_corpus_response(mut self, response: impl Into<String>) -> Self {
        self.config.empty_corpus_response = response.into();
        self
    }

    /// Build the [`EngineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidK`] if `top_k` is zero.
    pub fn build(self) -> Result<EngineConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::InvalidK(self.config.top_k));
        }
        Ok(self.config)
    }
}
