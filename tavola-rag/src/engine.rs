//! Query-serving orchestrator.
//!
//! [`RetrievalEngine`] is the single externally-consumed surface of the
//! serving phase: it embeds a question, searches the index, assembles a
//! grounding context from the matched documents, and delegates to the
//! generation collaborator. The store and index are immutable after
//! load and shared read-only across concurrent `answer` calls; only the
//! conversation log mutates, behind a mutex.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::conversation::{ConversationLog, ConversationTurn};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generation::Generator;
use crate::index::{INDEX_FILE, SimilarityIndex};
use crate::store::EmbeddingStore;

const ANSWER_MARKER: &str = "Answer:";

/// Answers natural-language questions from a persisted knowledge base.
pub struct RetrievalEngine {
    store: Arc<EmbeddingStore>,
    index: Arc<SimilarityIndex>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: EngineConfig,
    log: Mutex<ConversationLog>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("documents", &self.store.len())
            .field("dimension", &self.store.dimension())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine {
    /// Assemble an engine from an already-loaded store and index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptStore`] if the index and store
    /// disagree on length or width, and [`RagError::StoreModelMismatch`]
    /// if the embedder's dimension differs from the store's.
    pub fn new(
        store: EmbeddingStore,
        index: SimilarityIndex,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: EngineConfig,
    ) -> Result<Self> {
        if index.len() != store.len() {
            return Err(RagError::CorruptStore(format!(
                "index holds {} vectors but store holds {} documents",
                index.len(),
                store.len()
            )));
        }
        if !store.is_empty() && index.dimension() != store.dimension() {
            return Err(RagError::CorruptStore(format!(
                "index dimension {} does not match store dimension {}",
                index.dimension(),
                store.dimension()
            )));
        }
        if !store.is_empty() && embedder.dimension() != store.dimension() {
            return Err(RagError::StoreModelMismatch {
                store: store.dimension(),
                embedder: embedder.dimension(),
            });
        }

        Ok(Self {
            store: Arc::new(store),
            index: Arc::new(index),
            embedder,
            generator,
            config,
            log: Mutex::new(ConversationLog::new()),
        })
    }

    /// Load the persisted store/index pair from `dir` and assemble an engine.
    ///
    /// # Errors
    ///
    /// Propagates load failures ([`RagError::CorruptStore`],
    /// [`RagError::Io`]) and the validation failures of
    /// [`new`](Self::new).
    pub fn open(
        dir: &std::path::Path,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: EngineConfig,
    ) -> Result<Self> {
        let store = EmbeddingStore::open(dir)?;
        let index = SimilarityIndex::open(&dir.join(INDEX_FILE))?;
        Self::new(store, index, embedder, generator, config)
    }

    /// Answer a question using the configured `top_k`.
    ///
    /// # Errors
    ///
    /// See [`answer_with_top_k`](Self::answer_with_top_k).
    pub async fn answer(&self, question: &str) -> Result<String> {
        self.answer_with_top_k(question, self.config.top_k).await
    }

    /// Answer a question, retrieving `top_k` documents into the context.
    ///
    /// On an empty corpus the engine short-circuits with the configured
    /// fixed response instead of generating; the turn is still logged.
    /// A failed call appends nothing to the conversation log and leaves
    /// subsequent calls unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyQuery`] for a blank question,
    /// [`RagError::InvalidK`] for `top_k == 0`,
    /// [`RagError::StoreModelMismatch`] if the query embedding width
    /// differs from the store's, and [`RagError::CollaboratorFailure`]
    /// if the embedder or generator fails. No retries are performed.
    pub async fn answer_with_top_k(&self, question: &str, top_k: usize) -> Result<String> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }
        // Validated up front so a zero k is rejected even when the
        // empty-corpus short-circuit would skip the index search.
        if top_k == 0 {
            return Err(RagError::InvalidK(top_k));
        }

        if self.store.is_empty() {
            let answer = self.config.empty_corpus_response.clone();
            self.record_turn(question, &answer).await;
            info!("answered from empty corpus with fixed response");
            return Ok(answer);
        }

        let query_vector = self.embedder.embed(question).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::CollaboratorFailure {
                collaborator: "embedder".to_string(),
                message: e.to_string(),
            }
        })?;
        if query_vector.len() != self.store.dimension() {
            return Err(RagError::StoreModelMismatch {
                store: self.store.dimension(),
                embedder: query_vector.len(),
            });
        }

        let hits = self.index.search(&query_vector, top_k)?;
        let context = hits
            .iter()
            .filter_map(|hit| self.store.get(hit.index))
            .map(|(doc, _)| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!("Context: {context}\n\nQuestion: {question}\n{ANSWER_MARKER}");
        let generated = self.generator.generate(&prompt).await.map_err(|e| {
            error!(error = %e, "generation failed");
            RagError::CollaboratorFailure {
                collaborator: "generator".to_string(),
                message: e.to_string(),
            }
        })?;

        let answer = extract_answer(&generated).to_string();
        self.record_turn(question, &answer).await;
        info!(retrieved = hits.len(), "answered question");
        Ok(answer)
    }

    /// Snapshot of the conversation so far, in arrival order.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.log.lock().await.all().to_vec()
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The served store.
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    async fn record_turn(&self, question: &str, answer: &str) {
        self.log.lock().await.append(ConversationTurn {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }
}

/// Extract the answer from generated text: everything after the last
/// `"Answer:"` marker, trimmed. Without a marker the whole trimmed text
/// is the answer.
fn extract_answer(generated: &str) -> &str {
    match generated.rfind(ANSWER_MARKER) {
        Some(pos) => generated[pos + ANSWER_MARKER.len()..].trim(),
        None => generated.trim(),
    }
}
