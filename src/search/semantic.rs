//! Dense-vector semantic scoring
//!
//! Cosine similarity between the unit query embedding and every record
//! row. Rows are unit-normalized at index build, so this is a dot
//! product; negative similarities carry no signal and clamp to 0.

use crate::embedding::{dot, EmbeddingMatrix};

/// Score every record against the query embedding. Dense over the
/// record space, clamped to [0, 1]. A query vector of the wrong width
/// yields all zeros (degraded backend rather than a failed query).
pub(crate) fn score_records(query_embedding: &[f32], matrix: &EmbeddingMatrix) -> Vec<f32> {
    if query_embedding.len() != matrix.dim() {
        return vec![0.0; matrix.rows()];
    }

    (0..matrix.rows())
        .map(|i| dot(matrix.row(i), query_embedding).clamp(0.0, 1.0))
        .collect()
}
