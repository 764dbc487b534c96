//! Document/embedding store with a strict positional invariant.
//!
//! An [`EmbeddingStore`] holds the document sequence and their embedding
//! vectors in lockstep: `documents[i]` and row `i` of the matrix always
//! refer to the same logical unit. The two are built, persisted, and
//! reloaded together; [`EmbeddingStore::open`] re-verifies the invariant
//! on every load. The store is write-once, read-many: built in one
//! offline pass, then served read-only.
//!
//! On disk the store is a pair of coupled artifacts in one directory:
//! `documents.json` (ordered JSON array) and `embeddings.bin` (a small
//! header followed by the row-major little-endian `f32` matrix), sealed
//! by a `manifest.json` carrying a blake3 fingerprint of each. All three
//! are written to temporary names and renamed into place, the manifest
//! last, so a crash mid-promotion leaves a pair that fails fingerprint
//! verification instead of a silently mismatched one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Document;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

/// File name of the persisted document sequence.
pub const DOCUMENTS_FILE: &str = "documents.json";
/// File name of the persisted embedding matrix.
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";
/// File name of the manifest sealing the artifact pair.
pub const MANIFEST_FILE: &str = "manifest.json";

const MATRIX_MAGIC: [u8; 4] = *b"TVLA";
const MATRIX_VERSION: u32 = 1;
const MATRIX_HEADER_LEN: usize = 4 + 4 + 8 + 8;
const MANIFEST_VERSION: u32 = 1;

/// Fingerprints of one promoted document/matrix pair.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    documents_hash: String,
    embeddings_hash: String,
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Documents and their embedding vectors, in strict parallel order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingStore {
    documents: Vec<Document>,
    // Row-major matrix, documents.len() rows of `dimension` f32s.
    matrix: Vec<f32>,
    dimension: usize,
}

impl EmbeddingStore {
    /// Embed every document's content and build a store.
    ///
    /// Invokes the embedder once per document, in document order. All
    /// vectors must have the width the embedder reports.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CollaboratorFailure`] if the embedder fails,
    /// or [`RagError::DimensionMismatch`] if any returned vector has an
    /// unexpected width. A failed build yields no store at all.
    pub async fn build(documents: Vec<Document>, embedder: &dyn Embedder) -> Result<Self> {
        let dimension = embedder.dimension();
        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let vectors = embedder.embed_batch(&texts).await.map_err(|e| {
            RagError::CollaboratorFailure {
                collaborator: "embedder".to_string(),
                message: e.to_string(),
            }
        })?;
        if vectors.len() != documents.len() {
            return Err(RagError::CollaboratorFailure {
                collaborator: "embedder".to_string(),
                message: format!(
                    "returned {} vectors for {} documents",
                    vectors.len(),
                    documents.len()
                ),
            });
        }

        let mut matrix = Vec::with_capacity(documents.len() * dimension);
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            matrix.extend_from_slice(vector);
        }

        info!(documents = documents.len(), dimension, "embedding store built");
        Ok(Self { documents, matrix, dimension })
    }

    /// Reassemble a store from parts already in memory.
    ///
    /// Used by [`open`](Self::open) and by tests that need a store
    /// without invoking an embedder.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptStore`] if the matrix length is not
    /// `documents.len() * dimension`.
    pub fn from_parts(
        documents: Vec<Document>,
        matrix: Vec<f32>,
        dimension: usize,
    ) -> Result<Self> {
        if matrix.len() != documents.len() * dimension {
            return Err(RagError::CorruptStore(format!(
                "matrix holds {} values, expected {} documents x {} dimensions",
                matrix.len(),
                documents.len(),
                dimension
            )));
        }
        Ok(Self { documents, matrix, dimension })
    }

    /// Persist the document/vector pair into `dir`.
    ///
    /// Both artifacts land under temporary names first and are then
    /// renamed into place, replacing any previous pair. A manifest with
    /// blake3 fingerprints of both files is promoted last, so a crash
    /// between the renames leaves a pair that
    /// [`open`](Self::open) rejects instead of serving a stale half.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] or [`RagError::Serde`] if writing fails;
    /// the previous artifacts are left in place in that case.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let docs_bytes = serde_json::to_vec_pretty(&self.documents)?;
        let matrix_bytes = self.encode_matrix();
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            documents_hash: content_hash(&docs_bytes),
            embeddings_hash: content_hash(&matrix_bytes),
        };

        let docs_tmp = dir.join(format!("{DOCUMENTS_FILE}.tmp"));
        let matrix_tmp = dir.join(format!("{EMBEDDINGS_FILE}.tmp"));
        let manifest_tmp = dir.join(format!("{MANIFEST_FILE}.tmp"));

        fs::write(&docs_tmp, docs_bytes)?;
        fs::write(&matrix_tmp, matrix_bytes)?;
        fs::write(&manifest_tmp, serde_json::to_vec_pretty(&manifest)?)?;

        fs::rename(&matrix_tmp, dir.join(EMBEDDINGS_FILE))?;
        fs::rename(&docs_tmp, dir.join(DOCUMENTS_FILE))?;
        fs::rename(&manifest_tmp, dir.join(MANIFEST_FILE))?;

        info!(dir = %dir.display(), documents = self.documents.len(), "embedding store persisted");
        Ok(())
    }

    /// Load a previously persisted store from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptStore`] if either artifact does not
    /// match the manifest fingerprints, the matrix header is malformed,
    /// the payload length disagrees with the header, or the row count
    /// differs from the document count.
    pub fn open(dir: &Path) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(RagError::CorruptStore(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        let docs_bytes = fs::read(dir.join(DOCUMENTS_FILE))?;
        if content_hash(&docs_bytes) != manifest.documents_hash {
            return Err(RagError::CorruptStore(
                "document sequence does not match the manifest fingerprint".to_string(),
            ));
        }
        let matrix_bytes = fs::read(dir.join(EMBEDDINGS_FILE))?;
        if content_hash(&matrix_bytes) != manifest.embeddings_hash {
            return Err(RagError::CorruptStore(
                "embedding matrix does not match the manifest fingerprint".to_string(),
            ));
        }

        let documents: Vec<Document> = serde_json::from_slice(&docs_bytes)?;
        let (matrix, rows, dimension) = decode_matrix(&matrix_bytes)?;

        if rows != documents.len() {
            return Err(RagError::CorruptStore(format!(
                "document count {} does not match matrix row count {rows}",
                documents.len()
            )));
        }

        info!(dir = %dir.display(), documents = documents.len(), dimension, "embedding store opened");
        Ok(Self { documents, matrix, dimension })
    }

    /// The document and vector at position `i`, if in range.
    pub fn get(&self, i: usize) -> Option<(&Document, &[f32])> {
        let doc = self.documents.get(i)?;
        let row = &self.matrix[i * self.dimension..(i + 1) * self.dimension];
        Some((doc, row))
    }

    /// Number of document/vector pairs.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vector width shared by every row.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The documents in store order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Iterate over embedding rows in store order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.matrix.chunks_exact(self.dimension.max(1))
    }

    fn encode_matrix(&self) -> Vec<u8> {
        let rows = self.documents.len();
        let mut buf = Vec::with_capacity(MATRIX_HEADER_LEN + self.matrix.len() * 4);
        buf.extend_from_slice(&MATRIX_MAGIC);
        buf.extend_from_slice(&MATRIX_VERSION.to_le_bytes());
        buf.extend_from_slice(&(rows as u64).to_le_bytes());
        buf.extend_from_slice(&(self.dimension as u64).to_le_bytes());
        for value in &self.matrix {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }
}

fn decode_matrix(bytes: &[u8]) -> Result<(Vec<f32>, usize, usize)> {
    if bytes.len() < MATRIX_HEADER_LEN {
        return Err(RagError::CorruptStore("embedding matrix file is truncated".to_string()));
    }
    if bytes[0..4] != MATRIX_MAGIC {
        return Err(RagError::CorruptStore("embedding matrix has wrong magic bytes".to_string()));
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().expect("4 bytes"));
    if version != MATRIX_VERSION {
        return Err(RagError::CorruptStore(format!(
            "unsupported embedding matrix version {version}"
        )));
    }
    let rows = u64::from_le_bytes(bytes[8..16].try_into().expect("8 bytes")) as usize;
    let dimension = u64::from_le_bytes(bytes[16..24].try_into().expect("8 bytes")) as usize;

    let payload = &bytes[MATRIX_HEADER_LEN..];
    let expected = rows
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| RagError::CorruptStore("embedding matrix header overflows".to_string()))?;
    if payload.len() != expected {
        return Err(RagError::CorruptStore(format!(
            "embedding matrix payload is {} bytes, header implies {expected}",
            payload.len()
        )));
    }

    let matrix = payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("4 bytes")))
        .collect();
    Ok((matrix, rows, dimension))
}
