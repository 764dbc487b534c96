//! Error types for the `tavola-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval engine operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A restaurant record was malformed and could not be turned into documents.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An embedding vector had a different width than expected.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected vector width.
        expected: usize,
        /// The width actually observed.
        actual: usize,
    },

    /// A persisted store or index failed structural validation on load.
    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    /// A non-positive `top_k` was requested.
    #[error("Invalid k: top_k must be at least 1, got {0}")]
    InvalidK(usize),

    /// A blank question was submitted to the engine.
    #[error("Empty query")]
    EmptyQuery,

    /// The query-time embedder does not match the embedder the store was built with.
    #[error("Store/model mismatch: store dimension {store}, embedder dimension {embedder}")]
    StoreModelMismatch {
        /// The vector width of the persisted store.
        store: usize,
        /// The vector width reported by the configured embedder.
        embedder: usize,
    },

    /// An external collaborator (embedder or generator) failed.
    #[error("Collaborator failure ({collaborator}): {message}")]
    CollaboratorFailure {
        /// The collaborator that produced the error.
        collaborator: String,
        /// A description of the failure.
        message: String,
    },

    /// An I/O error while persisting or loading artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization error while persisting or loading documents.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A convenience result type for retrieval engine operations.
pub type Result<T> = std::result::Result<T, RagError>;
