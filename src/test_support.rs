//! Shared helpers for unit tests

use crate::catalog::Catalog;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::index::SearchIndex;

/// Embedder producing all-zero vectors: semantic scoring contributes
/// nothing, which keeps keyword/fuzzy assertions exact.
pub(crate) struct ZeroEmbedder;

impl EmbeddingProvider for ZeroEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.0; self.dimension()])
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension()]).collect())
    }

    fn dimension(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        "zero-test"
    }
}

/// Index over a catalog with zeroed embeddings.
pub(crate) fn index_from(catalog: Catalog) -> SearchIndex {
    SearchIndex::build(catalog, Some(&ZeroEmbedder), None, 8).expect("test index build")
}
