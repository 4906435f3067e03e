//! The immutable search index
//!
//! One `SearchIndex` is built at startup from the joined catalog and is
//! shared read-only (behind `Arc`) by every query: records, the record
//! embedding matrix, the corpus word set for the gibberish gate, and
//! per-offer product counts for the density penalty. Queries never
//! mutate it, so the hot path takes no locks.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::catalog::{build_records, Catalog, Offer, Product, SearchRecord};
use crate::embedding::{
    cache, EmbeddingError, EmbeddingMatrix, EmbeddingProvider,
};
use crate::error::Result;

pub struct SearchIndex {
    offers: Vec<Offer>,
    products: Vec<Product>,
    records: Vec<SearchRecord>,
    embeddings: EmbeddingMatrix,
    corpus_words: HashSet<String>,
    product_counts: HashMap<String, usize>,
}

impl SearchIndex {
    /// Build the index: flatten the catalog into records, then load or
    /// compute their embeddings.
    ///
    /// Cache handling: a cache whose content hash matches the current
    /// record texts is used as-is; a mismatched or unreadable cache is
    /// recomputed and overwritten. If the embedding backend is
    /// unavailable (`provider` is `None` or generation fails), a cache
    /// with the right shape is accepted as stale fallback; with no such
    /// cache the error is fatal.
    pub fn build(
        catalog: Catalog,
        provider: Option<&dyn EmbeddingProvider>,
        cache_path: Option<&Path>,
        batch_size: usize,
    ) -> Result<Self> {
        let records = build_records(&catalog);
        tracing::info!(
            offers = catalog.offer_count(),
            products = catalog.product_count(),
            records = records.len(),
            "building search index"
        );

        let texts: Vec<String> = records.iter().map(|r| r.embed_text.clone()).collect();
        let hash = cache::content_hash(&texts);

        let cached = cache_path.and_then(|path| match cache::load(path) {
            Ok(cached) => Some(cached),
            Err(cache::CacheError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                None
            }
            Err(e) => {
                tracing::warn!("embedding cache unreadable, will recompute: {e}");
                None
            }
        });

        let dim = provider.map(|p| p.dimension());
        let embeddings = match (&cached, dim) {
            (Some(cached), dim)
                if cached.matches(&hash, records.len(), dim.unwrap_or(cached.matrix.dim())) =>
            {
                tracing::info!(rows = cached.matrix.rows(), "embedding cache hit");
                cached.matrix.clone()
            }
            _ => Self::compute_embeddings(
                provider,
                &texts,
                &hash,
                cached.as_ref(),
                cache_path,
                batch_size,
            )?,
        };

        let mut corpus_words = HashSet::new();
        for record in &records {
            corpus_words.extend(record.text.split_whitespace().map(str::to_string));
        }

        let product_counts = catalog
            .offers
            .iter()
            .map(|offer| {
                (
                    offer.offer_id.clone(),
                    catalog.products_for(&offer.offer_id).len(),
                )
            })
            .collect();

        Ok(Self {
            offers: catalog.offers,
            products: catalog.products,
            records,
            embeddings,
            corpus_words,
            product_counts,
        })
    }

    fn compute_embeddings(
        provider: Option<&dyn EmbeddingProvider>,
        texts: &[String],
        hash: &[u8; 32],
        cached: Option<&cache::CachedEmbeddings>,
        cache_path: Option<&Path>,
        batch_size: usize,
    ) -> Result<EmbeddingMatrix> {
        let computed = match provider {
            Some(provider) => Self::embed_all(provider, texts, batch_size),
            None => Err(EmbeddingError::InitializationError(
                "no embedding backend configured".to_string(),
            )),
        };

        match computed {
            Ok(matrix) => {
                if let Some(path) = cache_path {
                    if let Err(e) = cache::save(path, hash, &matrix) {
                        tracing::warn!("failed to write embedding cache: {e}");
                    } else {
                        tracing::info!(path = %path.display(), "embedding cache written");
                    }
                }
                Ok(matrix)
            }
            Err(e) => {
                // Stale-cache fallback: shape must match even though the
                // content hash does not.
                if let Some(cached) = cached {
                    let dim = cached.matrix.dim();
                    if cached.shape_matches(texts.len(), dim) {
                        tracing::warn!(
                            "embedding backend unavailable ({e}); using stale cache"
                        );
                        return Ok(cached.matrix.clone());
                    }
                }
                Err(e.into())
            }
        }
    }

    fn embed_all(
        provider: &dyn EmbeddingProvider,
        texts: &[String],
        batch_size: usize,
    ) -> std::result::Result<EmbeddingMatrix, EmbeddingError> {
        let dim = provider.dimension();
        if texts.is_empty() {
            return EmbeddingMatrix::empty(dim)
                .map_err(|e| EmbeddingError::GenerationError(e.to_string()));
        }

        let batch_size = batch_size.max(1);
        let mut rows = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size) {
            rows.extend(provider.embed_batch(chunk)?);
        }
        tracing::info!(rows = rows.len(), dim, "embeddings computed");

        EmbeddingMatrix::from_rows(rows, dim)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn offer(&self, index: usize) -> &Offer {
        &self.offers[index]
    }

    pub fn product(&self, index: usize) -> &Product {
        &self.products[index]
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    pub fn corpus_words(&self) -> &HashSet<String> {
        &self.corpus_words
    }

    /// Qualifying-product count for an offer (0 for offer-only deals).
    pub fn product_count(&self, offer_id: &str) -> usize {
        self.product_counts.get(offer_id).copied().unwrap_or(0)
    }
}
