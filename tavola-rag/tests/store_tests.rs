//! Persistence and invariant tests for the embedding store.

use std::collections::HashMap;
use std::fs;

use async_trait::async_trait;
use tavola_rag::document::{Document, DocumentKind};
use tavola_rag::embedding::Embedder;
use tavola_rag::error::{RagError, Result};
use tavola_rag::mock::HashEmbedder;
use tavola_rag::store::{DOCUMENTS_FILE, EMBEDDINGS_FILE, EmbeddingStore, MANIFEST_FILE};

const DIM: usize = 16;

fn doc(id: &str, content: &str) -> Document {
    Document {
        id: id.to_string(),
        kind: DocumentKind::RestaurantInfo,
        content: content.to_string(),
        metadata: HashMap::new(),
    }
}

fn sample_docs() -> Vec<Document> {
    vec![
        doc("restaurant-cafe-x", "Restaurant: Cafe X\nCuisine: Cafe"),
        doc("restaurant-cafe-y", "Restaurant: Cafe Y\nCuisine: Pizza"),
        doc("reviews-cafe-x", "Restaurant: Cafe X\nReviews:\n- A (Rating: 5): good"),
    ]
}

#[tokio::test]
async fn build_keeps_documents_and_vectors_in_lockstep() {
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.dimension(), DIM);
    for (i, expected) in sample_docs().iter().enumerate() {
        let (document, vector) = store.get(i).unwrap();
        assert_eq!(document.id, expected.id);
        assert_eq!(vector.len(), DIM);
        // Vector i must be the embedding of document i's content.
        assert_eq!(vector, embedder.embed(&expected.content).await.unwrap().as_slice());
    }
    assert!(store.get(3).is_none());
}

#[tokio::test]
async fn persist_and_open_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    store.persist(dir.path()).unwrap();

    let reopened = EmbeddingStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), store.len());
    assert_eq!(reopened.dimension(), store.dimension());
    for i in 0..store.len() {
        assert_eq!(reopened.get(i), store.get(i));
    }
    assert!(!dir.path().join(format!("{DOCUMENTS_FILE}.tmp")).exists());
    assert!(!dir.path().join(format!("{EMBEDDINGS_FILE}.tmp")).exists());
    assert!(!dir.path().join(format!("{MANIFEST_FILE}.tmp")).exists());
}

#[tokio::test]
async fn persist_replaces_a_previous_pair() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);

    let first = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    first.persist(dir.path()).unwrap();

    let second = EmbeddingStore::build(vec![doc("only", "one doc")], &embedder).await.unwrap();
    second.persist(dir.path()).unwrap();

    let reopened = EmbeddingStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get(0).unwrap().0.id, "only");
}

#[tokio::test]
async fn open_rejects_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    store.persist(dir.path()).unwrap();

    // Truncate the document sequence while leaving the matrix alone.
    let truncated = serde_json::to_vec(&store.documents()[..2]).unwrap();
    fs::write(dir.path().join(DOCUMENTS_FILE), truncated).unwrap();

    let err = EmbeddingStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

#[tokio::test]
async fn open_rejects_stale_documents_with_matching_count() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    store.persist(dir.path()).unwrap();

    // Same document count, different content. A counts-only check would
    // pair these documents with the wrong vectors; the manifest
    // fingerprint catches the swap.
    let stale = vec![
        doc("restaurant-cafe-z", "Restaurant: Cafe Z\nCuisine: Thai"),
        doc("restaurant-cafe-w", "Restaurant: Cafe W\nCuisine: Sushi"),
        doc("reviews-cafe-z", "Restaurant: Cafe Z\nReviews:\n- B (Rating: 2): meh"),
    ];
    fs::write(dir.path().join(DOCUMENTS_FILE), serde_json::to_vec(&stale).unwrap()).unwrap();

    let err = EmbeddingStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

#[tokio::test]
async fn open_rejects_truncated_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    store.persist(dir.path()).unwrap();

    let mut bytes = fs::read(dir.path().join(EMBEDDINGS_FILE)).unwrap();
    bytes.truncate(bytes.len() - 4);
    fs::write(dir.path().join(EMBEDDINGS_FILE), bytes).unwrap();

    let err = EmbeddingStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

#[tokio::test]
async fn open_rejects_wrong_magic() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    store.persist(dir.path()).unwrap();

    let mut bytes = fs::read(dir.path().join(EMBEDDINGS_FILE)).unwrap();
    bytes[0] = b'X';
    fs::write(dir.path().join(EMBEDDINGS_FILE), bytes).unwrap();

    let err = EmbeddingStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

/// An embedder whose second vector has the wrong width.
struct RaggedEmbedder;

#[async_trait]
impl Embedder for RaggedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("Cafe Y") { Ok(vec![0.0; DIM + 1]) } else { Ok(vec![0.0; DIM]) }
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

#[tokio::test]
async fn build_rejects_inconsistent_vector_widths() {
    let err = EmbeddingStore::build(sample_docs(), &RaggedEmbedder).await.unwrap_err();
    assert!(
        matches!(err, RagError::DimensionMismatch { expected: DIM, actual } if actual == DIM + 1),
        "got {err:?}"
    );
}

#[tokio::test]
async fn empty_corpus_builds_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashEmbedder::new(DIM);
    let store = EmbeddingStore::build(Vec::new(), &embedder).await.unwrap();
    assert!(store.is_empty());

    store.persist(dir.path()).unwrap();
    let reopened = EmbeddingStore::open(dir.path()).unwrap();
    assert!(reopened.is_empty());
    assert_eq!(reopened.dimension(), DIM);
}

#[test]
fn from_parts_rejects_misaligned_matrix() {
    let err = EmbeddingStore::from_parts(sample_docs(), vec![0.0; DIM], DIM).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

#[tokio::test]
async fn rebuilding_from_identical_documents_is_identical() {
    let embedder = HashEmbedder::new(DIM);
    let first = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    let second = EmbeddingStore::build(sample_docs(), &embedder).await.unwrap();
    assert_eq!(first, second);
}
