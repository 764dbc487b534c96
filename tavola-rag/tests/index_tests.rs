//! Search-semantics tests for the flat similarity index.

use proptest::prelude::*;
use tavola_rag::error::RagError;
use tavola_rag::index::{DistanceMetric, INDEX_FILE, SimilarityIndex};

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[test]
fn search_returns_the_globally_closest_vector_first() {
    let vectors = vec![
        vec![10.0, 10.0],
        vec![0.0, 1.0],
        vec![5.0, 5.0],
        vec![0.1, 0.9], // closest to the query below
    ];
    let index = SimilarityIndex::build(&vectors).unwrap();

    let hits = index.search(&[0.0, 0.9], 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 3);
}

#[test]
fn results_are_ascending_by_distance() {
    let vectors = vec![vec![3.0, 0.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![0.5, 0.0]];
    let index = SimilarityIndex::build(&vectors).unwrap();

    let hits = index.search(&[0.0, 0.0], 4).unwrap();
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![3, 1, 2, 0]);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn equal_distances_break_ties_by_lower_index() {
    let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]];
    let index = SimilarityIndex::build(&vectors).unwrap();

    let hits = index.search(&[0.0, 0.0], 4).unwrap();
    // All four vectors are unit distance from the origin.
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[test]
fn k_larger_than_corpus_returns_everything() {
    let vectors = vec![vec![1.0], vec![2.0]];
    let index = SimilarityIndex::build(&vectors).unwrap();
    let hits = index.search(&[0.0], 10).unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn zero_k_is_rejected() {
    let index = SimilarityIndex::build(&[vec![1.0]]).unwrap();
    let err = index.search(&[0.0], 0).unwrap_err();
    assert!(matches!(err, RagError::InvalidK(0)), "got {err:?}");
}

#[test]
fn query_width_mismatch_is_rejected() {
    let index = SimilarityIndex::build(&[vec![1.0, 2.0]]).unwrap();
    let err = index.search(&[0.0], 1).unwrap_err();
    assert!(
        matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1 }),
        "got {err:?}"
    );
}

#[test]
fn ragged_build_input_is_rejected() {
    let err = SimilarityIndex::build(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { .. }), "got {err:?}");
}

#[test]
fn empty_index_returns_no_hits() {
    let index = SimilarityIndex::build(&[]).unwrap();
    let hits = index.search(&[1.0, 2.0], 5).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn persist_and_open_preserve_rankings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(INDEX_FILE);
    let vectors = vec![vec![0.2, 0.8], vec![0.9, 0.1], vec![0.5, 0.5]];
    let index = SimilarityIndex::build(&vectors).unwrap();
    index.persist(&path).unwrap();

    let reopened = SimilarityIndex::open(&path).unwrap();
    assert_eq!(reopened, index);

    let query = [0.4, 0.6];
    assert_eq!(reopened.search(&query, 3).unwrap(), index.search(&query, 3).unwrap());
}

#[test]
fn open_rejects_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(INDEX_FILE);
    let index = SimilarityIndex::build(&[vec![1.0, 2.0]]).unwrap();
    index.persist(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 2);
    std::fs::write(&path, bytes).unwrap();

    let err = SimilarityIndex::open(&path).unwrap_err();
    assert!(matches!(err, RagError::CorruptStore(_)), "got {err:?}");
}

#[test]
fn cosine_metric_ranks_by_angle_not_magnitude() {
    let vectors = vec![vec![10.0, 0.0], vec![0.0, 1.0]];
    let index = SimilarityIndex::build_with_metric(&vectors, DistanceMetric::Cosine).unwrap();

    // Under cosine the long vector along x is a perfect match for an
    // x-aligned query; under squared L2 it would rank last.
    let hits = index.search(&[1.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].index, 0);
    assert!(hits[0].distance.abs() < 1e-6);
}

fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
}

/// For any stored set, search results are ascending by distance, bounded
/// by `min(k, len)`, and `search(v, 1)` agrees with a brute-force scan.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_ascending_and_bounded_by_top_k(
            vectors in proptest::collection::vec(arb_vector(DIM), 1..20),
            query in arb_vector(DIM),
            top_k in 1usize..25,
        ) {
            let index = SimilarityIndex::build(&vectors).unwrap();
            let hits = index.search(&query, top_k).unwrap();

            prop_assert_eq!(hits.len(), top_k.min(vectors.len()));

            for window in hits.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "results not in ascending order: {} > {}",
                    window[0].distance,
                    window[1].distance,
                );
            }

            // The first hit matches a brute-force argmin.
            let best = vectors
                .iter()
                .enumerate()
                .map(|(i, v)| (i, squared_l2(&query, v)))
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .unwrap();
            prop_assert_eq!(hits[0].index, best.0);
            prop_assert!((hits[0].distance - best.1).abs() < 1e-6);
        }
    }
}
