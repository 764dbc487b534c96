//! Exact nearest-neighbor search over embedding vectors.
//!
//! [`SimilarityIndex`] is a flat (brute-force) index: every query scans
//! every stored vector. That is the correct algorithm for a bounded
//! city-restaurant corpus of thousands to tens of thousands of vectors;
//! approximate indexing would change ranking semantics. The index is
//! immutable after build — the only supported update path is a batch
//! rebuild.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{RagError, Result};

/// File name of the persisted similarity index.
pub const INDEX_FILE: &str = "index.bin";

const INDEX_MAGIC: [u8; 4] = *b"TVLI";
const INDEX_VERSION: u32 = 1;
const INDEX_HEADER_LEN: usize = 4 + 4 + 1 + 8 + 8;

/// Distance metric used to rank stored vectors against a query.
///
/// The default is squared Euclidean distance, matching a flat L2 index.
/// Cosine distance (`1 − cosine similarity`) ranks differently unless
/// all vectors are normalized, so switching metrics on an existing
/// corpus changes results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Squared L2 (Euclidean) distance; smaller is more similar.
    #[default]
    SquaredL2,
    /// `1 − cosine similarity`; smaller is more similar.
    Cosine,
}

impl DistanceMetric {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::SquaredL2 => a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::SquaredL2 => 0,
            Self::Cosine => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::SquaredL2),
            1 => Ok(Self::Cosine),
            other => Err(RagError::CorruptStore(format!("unknown distance metric tag {other}"))),
        }
    }
}

/// One search result: a stored vector's position and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the matched vector (and so of its document).
    pub index: usize,
    /// Distance under the index metric; smaller is more similar.
    pub distance: f32,
}

/// A flat exact-search index over fixed-width vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    // Row-major, len() rows of `dimension` f32s.
    data: Vec<f32>,
    rows: usize,
    dimension: usize,
    metric: DistanceMetric,
}

impl SimilarityIndex {
    /// Build an index over the given vectors with the default metric.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vectors do not all
    /// share one width.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        Self::build_with_metric(vectors, DistanceMetric::default())
    }

    /// Build an index with an explicit distance metric.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vectors do not all
    /// share one width.
    pub fn build_with_metric(vectors: &[Vec<f32>], metric: DistanceMetric) -> Result<Self> {
        let dimension = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }
        info!(vectors = vectors.len(), dimension, ?metric, "similarity index built");
        Ok(Self { data, rows: vectors.len(), dimension, metric })
    }

    /// Find the `k` nearest stored vectors to `query`.
    ///
    /// Returns `min(k, len)` hits sorted ascending by distance, ties
    /// broken by lower stored index, so results are deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidK`] if `k` is zero and
    /// [`RagError::DimensionMismatch`] if the query width differs from
    /// the stored width.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(RagError::InvalidK(k));
        }
        if self.rows > 0 && query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension.max(1))
            .enumerate()
            .map(|(index, row)| SearchHit { index, distance: self.metric.distance(query, row) })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        hits.truncate(k);
        Ok(hits)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Width of the stored vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The metric this index ranks by.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Persist the index to `path`, replacing any previous file.
    ///
    /// The file lands under a temporary name first and is renamed into
    /// place.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if writing fails.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::with_capacity(INDEX_HEADER_LEN + self.data.len() * 4);
        buf.extend_from_slice(&INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        buf.push(self.metric.tag());
        buf.extend_from_slice(&(self.rows as u64).to_le_bytes());
        buf.extend_from_slice(&(self.dimension as u64).to_le_bytes());
        for value in &self.data {
            buf.extend_from_slice(&value.to_le_bytes());
        }

        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, &buf)?;
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), vectors = self.rows, "similarity index persisted");
        Ok(())
    }

    /// Load a previously persisted index from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptStore`] if the header is malformed or
    /// the payload length disagrees with it.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        if bytes.len() < INDEX_HEADER_LEN {
            return Err(RagError::CorruptStore("index file is truncated".to_string()));
        }
        if bytes[0..4] != INDEX_MAGIC {
            return Err(RagError::CorruptStore("index file has wrong magic bytes".to_string()));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().expect("4 bytes"));
        if version != INDEX_VERSION {
            return Err(RagError::CorruptStore(format!("unsupported index version {version}")));
        }
        let metric = DistanceMetric::from_tag(bytes[8])?;
        let rows = u64::from_le_bytes(bytes[9..17].try_into().expect("8 bytes")) as usize;
        let dimension = u64::from_le_bytes(bytes[17..25].try_into().expect("8 bytes")) as usize;

        let payload = &bytes[INDEX_HEADER_LEN..];
        let expected = rows
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| RagError::CorruptStore("index header overflows".to_string()))?;
        if payload.len() != expected {
            return Err(RagError::CorruptStore(format!(
                "index payload is {} bytes, header implies {expected}",
                payload.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("4 bytes")))
            .collect();

        info!(path = %path.display(), vectors = rows, dimension, "similarity index opened");
        Ok(Self { data, rows, dimension, metric })
    }
}

/// Compute cosine similarity between two vectors.
///
/// Both vectors are L2-normalized before computing the dot product.
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
