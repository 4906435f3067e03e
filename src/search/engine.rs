//! Query execution
//!
//! One query fans out across the three scorers (one blocking task each),
//! joins their dense score vectors, gates out gibberish, and hands the
//! vectors to the ranker. Scorers share nothing but the immutable index;
//! dropping the returned future abandons the query at the join boundary
//! without touching shared state.

use std::sync::Arc;

use tokio::task;

use crate::embedding::{l2_normalize, EmbeddingProvider};
use crate::index::SearchIndex;
use crate::search::ranker::STRONG_FUZZY;
use crate::search::{fuzzy, keyword, ranker, semantic, DealResult};

/// Query-path tunables, all defaulted to the engine's standard behavior.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Result-count cap
    pub top_k: usize,
    /// Deals per `search_stream` batch
    pub stream_batch_size: usize,
    /// Raw fuzzy cutoff on the 0-100 scale
    pub fuzzy_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 40,
            stream_batch_size: 5,
            fuzzy_threshold: fuzzy::DEFAULT_THRESHOLD,
        }
    }
}

/// The query-serving facade over an immutable [`SearchIndex`].
///
/// Queries never fail: empty input, gibberish, and internal scorer
/// trouble all come back as an empty result list.
pub struct SearchEngine {
    index: Arc<SearchIndex>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    options: SearchOptions,
}

impl SearchEngine {
    /// Engine with default options. `provider` may be `None` when the
    /// embedding backend is unavailable; semantic scoring then
    /// contributes nothing and keyword/fuzzy carry the query.
    pub fn new(index: Arc<SearchIndex>, provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self::with_options(index, provider, SearchOptions::default())
    }

    pub fn with_options(
        index: Arc<SearchIndex>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        options: SearchOptions,
    ) -> Self {
        Self {
            index,
            provider,
            options,
        }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Run one query and return ranked deals, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<DealResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let query_lower = query.to_lowercase();
        let words: Vec<String> = query_lower
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let started = std::time::Instant::now();
        let Some((keyword, fuzzy, semantic)) = self.run_scorers(&query_lower, &words).await
        else {
            return Vec::new();
        };

        if self.is_gibberish(&words, &keyword, &fuzzy) {
            tracing::debug!(query = %query_lower, "query rejected by gibberish gate");
            return Vec::new();
        }

        let results = ranker::rank(
            &self.index,
            &query_lower,
            &words,
            keyword,
            &fuzzy,
            &semantic,
            top_k,
        );
        tracing::debug!(
            query = %query_lower,
            deals = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        results
    }

    /// Like [`search`](Self::search), but exposes the frozen result list
    /// as score-descending batches for incremental emission.
    pub async fn search_stream(&self, query: &str, top_k: usize) -> ResultBatches {
        let results = self.search(query, top_k).await;
        ResultBatches::new(results, self.options.stream_batch_size)
    }

    /// Merged multi-term mode for externally expanded queries: rank each
    /// term independently, then fuse by offer with a multi-term boost.
    pub async fn search_expanded(&self, terms: &[String], top_k: usize) -> Vec<DealResult> {
        let mut per_term = Vec::with_capacity(terms.len());
        for term in terms {
            let results = self.search(term, top_k).await;
            if !results.is_empty() {
                per_term.push(results);
            }
        }
        ranker::merge_term_results(per_term, top_k)
    }

    async fn run_scorers(
        &self,
        query_lower: &str,
        words: &[String],
    ) -> Option<(Vec<f32>, Vec<f32>, Vec<f32>)> {
        let keyword_task = {
            let index = Arc::clone(&self.index);
            let words = words.to_vec();
            task::spawn_blocking(move || keyword::score_records(&words, &index))
        };

        let fuzzy_task = {
            let index = Arc::clone(&self.index);
            let query = query_lower.to_string();
            let threshold = self.options.fuzzy_threshold;
            task::spawn_blocking(move || fuzzy::score_records(&query, &index, threshold))
        };

        let semantic_task = {
            let index = Arc::clone(&self.index);
            let provider = self.provider.clone();
            let query = query_lower.to_string();
            task::spawn_blocking(move || semantic_scores(provider, &query, &index))
        };

        match tokio::join!(keyword_task, fuzzy_task, semantic_task) {
            (Ok(keyword), Ok(fuzzy), Ok(semantic)) => Some((keyword, fuzzy, semantic)),
            (keyword, fuzzy, semantic) => {
                for error in [keyword.err(), fuzzy.err(), semantic.err()]
                    .into_iter()
                    .flatten()
                {
                    tracing::warn!("scorer task failed: {error}");
                }
                None
            }
        }
    }

    /// A query is gibberish when no scorer found meaningful signal: no
    /// keyword hit anywhere, no strong fuzzy match, and not a single
    /// query word present in the corpus.
    fn is_gibberish(&self, words: &[String], keyword: &[f32], fuzzy: &[f32]) -> bool {
        if keyword.iter().any(|&s| s > 0.0) {
            return false;
        }
        if fuzzy.iter().any(|&s| s >= STRONG_FUZZY) {
            return false;
        }
        !words
            .iter()
            .any(|w| self.index.corpus_words().contains(w.as_str()))
    }
}

fn semantic_scores(
    provider: Option<Arc<dyn EmbeddingProvider>>,
    query: &str,
    index: &SearchIndex,
) -> Vec<f32> {
    let Some(provider) = provider else {
        return vec![0.0; index.record_count()];
    };
    match provider.embed(query) {
        Ok(mut embedding) => {
            l2_normalize(&mut embedding);
            semantic::score_records(&embedding, index.embeddings())
        }
        Err(e) => {
            tracing::warn!("query embedding failed, semantic scoring disabled: {e}");
            vec![0.0; index.record_count()]
        }
    }
}

/// Score-descending batches over one frozen result list.
///
/// Holds only the already-sorted results; iteration never re-sorts, so a
/// batch once emitted is final.
pub struct ResultBatches {
    results: std::vec::IntoIter<DealResult>,
    batch_size: usize,
}

impl ResultBatches {
    fn new(results: Vec<DealResult>, batch_size: usize) -> Self {
        Self {
            results: results.into_iter(),
            batch_size: batch_size.max(1),
        }
    }

    /// Deals left to emit.
    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}

impl Iterator for ResultBatches {
    type Item = Vec<DealResult>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<DealResult> = self.results.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
