//! Score fusion and deal-level ranking
//!
//! Per-record subscores from the three scorers are fused into one
//! composite, adjusted (fuzzy cap, semantic-only discount, multi-source
//! bonus), grouped into deals, adjusted again at deal level (offer-name
//! boost, match-density penalty), then trimmed by an adaptive cutoff.
//! Every step is a pure transformation over the score vectors; the final
//! ordering is a function of (records, embeddings, query) alone.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use rapidfuzz::fuzz;
use serde::Serialize;

use crate::catalog::{Offer, Product};
use crate::index::SearchIndex;

const KEYWORD_WEIGHT: f32 = 0.50;
const FUZZY_WEIGHT: f32 = 0.25;
const SEMANTIC_WEIGHT: f32 = 0.25;

const MULTI_SOURCE_BONUS: f32 = 0.1;
const MULTI_SOURCE_BONUS_CAP: f32 = 0.2;
const SEMANTIC_ONLY_DISCOUNT: f32 = 0.5;

const OFFER_NAME_BOOST: f32 = 1.2;
const OFFER_NAME_FUZZY_THRESHOLD: f64 = 80.0;

const DENSITY_FLOOR: f32 = 0.3;

/// Normalized fuzzy score that counts as a confident (typo-grade) match.
pub(crate) const STRONG_FUZZY: f32 = 0.8;

const HIGH_CONFIDENCE_TOP: f32 = 0.5;
const HIGH_CONFIDENCE_CUTOFF: f32 = 0.40;
const LOW_CONFIDENCE_CUTOFF: f32 = 0.70;
const MERGED_CUTOFF: f32 = 0.45;

const TERM_BONUS_STEP: f32 = 0.05;
const TERM_BONUS_CAP: f32 = 1.3;

/// Per-source subscore maxima for a deal, all on a [0, 1] scale.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScoreComponents {
    pub keyword: f32,
    pub fuzzy: f32,
    pub semantic: f32,
}

impl ScoreComponents {
    /// Names of the sources that contributed, for display.
    pub fn sources(&self) -> Vec<&'static str> {
        let mut sources = Vec::new();
        if self.keyword > 0.0 {
            sources.push("keyword");
        }
        if self.fuzzy > 0.0 {
            sources.push("fuzzy");
        }
        if self.semantic > 0.0 {
            sources.push("semantic");
        }
        sources
    }
}

/// A product that explains why its deal matched.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMatch {
    pub product: Product,
    /// Composite score of the product's record
    pub score: f32,
}

/// A deal surfaced by search, with the products that caused it to appear.
#[derive(Debug, Clone, Serialize)]
pub struct DealResult {
    pub offer: Offer,
    pub matching_products: Vec<ProductMatch>,
    pub score: f32,
    pub score_components: ScoreComponents,
}

/// Divide keyword scores by their per-query max, but only when the max
/// exceeds 1 — already-small keyword signals keep their scale.
pub(crate) fn normalize_keyword(scores: &mut [f32]) {
    let max = scores.iter().fold(0.0f32, |m, &s| m.max(s));
    if max > 1.0 {
        for score in scores.iter_mut() {
            *score /= max;
        }
    }
}

/// Fuse one record's normalized subscores into its composite.
///
/// Adjustments, in order: fuzzy is capped to the keyword score when both
/// matched (fuzzy recovers typos, it must not inflate exact matches); a
/// semantic-only record is discounted by half; records found by more
/// than one source earn +0.1 per extra source, at most +0.2.
pub(crate) fn composite_record(keyword: f32, fuzzy: f32, semantic: f32) -> f32 {
    let sources = u32::from(keyword > 0.0) + u32::from(fuzzy > 0.0) + u32::from(semantic > 0.0);
    if sources == 0 {
        return 0.0;
    }

    let fuzzy_capped = if keyword > 0.0 && fuzzy > 0.0 {
        fuzzy.min(keyword)
    } else {
        fuzzy
    };

    let mut composite =
        KEYWORD_WEIGHT * keyword + FUZZY_WEIGHT * fuzzy_capped + SEMANTIC_WEIGHT * semantic;

    if semantic > 0.0 && keyword == 0.0 && fuzzy == 0.0 {
        composite *= SEMANTIC_ONLY_DISCOUNT;
    }

    composite += (MULTI_SOURCE_BONUS * sources.saturating_sub(1) as f32).min(MULTI_SOURCE_BONUS_CAP);
    composite
}

/// Density penalty factor: a deal where few of its products matched is
/// scaled toward the floor, full coverage keeps the score intact.
pub(crate) fn density_factor(matched: usize, total: usize) -> f32 {
    DENSITY_FLOOR + (1.0 - DENSITY_FLOOR) * (matched as f32 / total as f32)
}

struct DealAccum {
    offer_index: usize,
    offer_name: String,
    score: f32,
    components: ScoreComponents,
    products: Vec<(usize, f32)>,
    keyword_matched: usize,
    strong_fuzzy_matched: usize,
}

/// Rank one query's score vectors into grouped, trimmed deal results.
///
/// `query` and `words` are lowercased; the three score vectors are dense
/// over the record space with fuzzy and semantic already on [0, 1].
pub(crate) fn rank(
    index: &SearchIndex,
    query: &str,
    words: &[String],
    mut keyword: Vec<f32>,
    fuzzy: &[f32],
    semantic: &[f32],
    top_k: usize,
) -> Vec<DealResult> {
    normalize_keyword(&mut keyword);

    // Group records into deals, keeping the best composite per deal and
    // the per-offer match counts the density penalty needs.
    let mut accums: HashMap<usize, DealAccum> = HashMap::new();
    for (i, record) in index.records().iter().enumerate() {
        let composite = composite_record(keyword[i], fuzzy[i], semantic[i]);
        if composite <= 0.0 {
            continue;
        }

        let accum = accums
            .entry(record.offer_index)
            .or_insert_with(|| DealAccum {
                offer_index: record.offer_index,
                offer_name: record.offer_name.clone(),
                score: 0.0,
                components: ScoreComponents::default(),
                products: Vec::new(),
                keyword_matched: 0,
                strong_fuzzy_matched: 0,
            });

        accum.score = accum.score.max(composite);
        accum.components.keyword = accum.components.keyword.max(keyword[i]);
        accum.components.fuzzy = accum.components.fuzzy.max(fuzzy[i]);
        accum.components.semantic = accum.components.semantic.max(semantic[i]);

        if let Some(product_index) = record.product_index {
            accum.products.push((product_index, composite));
            if keyword[i] > 0.0 {
                accum.keyword_matched += 1;
            }
            if fuzzy[i] >= STRONG_FUZZY {
                accum.strong_fuzzy_matched += 1;
            }
        }
    }

    let mut deals: Vec<DealAccum> = accums.into_values().collect();

    for deal in &mut deals {
        // Offer-name boost: deals matching the query by name beat deals
        // surfaced only through product matches. Fuzzy covers typos.
        let name_hit = words.iter().any(|w| deal.offer_name.contains(w.as_str()))
            || fuzz::partial_ratio(query.chars(), deal.offer_name.chars())
                >= OFFER_NAME_FUZZY_THRESHOLD;
        if name_hit {
            deal.score *= OFFER_NAME_BOOST;
        }

        // Density penalty. Offer-only deals take no penalty; for typo
        // queries where keyword matched none of this offer's products,
        // strong fuzzy matches stand in.
        let offer_id = &index.offer(deal.offer_index).offer_id;
        let total = index.product_count(offer_id);
        if total > 0 {
            let matched = if deal.keyword_matched > 0 {
                deal.keyword_matched
            } else {
                deal.strong_fuzzy_matched
            };
            deal.score *= density_factor(matched, total);
        }
    }

    deals.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| {
            let (oa, ob) = (index.offer(a.offer_index), index.offer(b.offer_index));
            oa.name
                .len()
                .cmp(&ob.name.len())
                .then_with(|| oa.offer_id.cmp(&ob.offer_id))
        })
    });

    // Adaptive cutoff: trim gently under a confident top score, harshly
    // when even the best match is weak.
    if let Some(top) = deals.first().map(|d| d.score) {
        let ratio = if top >= HIGH_CONFIDENCE_TOP {
            HIGH_CONFIDENCE_CUTOFF
        } else {
            LOW_CONFIDENCE_CUTOFF
        };
        let cutoff = top * ratio;
        deals.retain(|d| d.score >= cutoff);
    }

    deals.truncate(top_k);

    deals
        .into_iter()
        .map(|deal| DealResult {
            offer: index.offer(deal.offer_index).clone(),
            matching_products: deal
                .products
                .into_iter()
                .map(|(product_index, score)| ProductMatch {
                    product: index.product(product_index).clone(),
                    score,
                })
                .collect(),
            score: deal.score,
            score_components: deal.components,
        })
        .collect()
}

/// Merge per-term rankings from an expanded query into one result set.
///
/// Each deal keeps its best score across terms, boosted by how many
/// distinct terms surfaced it, then a stricter cutoff trims the merged
/// tail.
pub(crate) fn merge_term_results(
    per_term: Vec<Vec<DealResult>>,
    top_k: usize,
) -> Vec<DealResult> {
    let mut merged: HashMap<String, DealResult> = HashMap::new();
    let mut term_hits: HashMap<String, usize> = HashMap::new();

    for results in per_term {
        for deal in results {
            let offer_id = deal.offer.offer_id.clone();
            *term_hits.entry(offer_id.clone()).or_insert(0) += 1;
            match merged.entry(offer_id) {
                Entry::Occupied(mut entry) => {
                    if deal.score > entry.get().score {
                        entry.insert(deal);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(deal);
                }
            }
        }
    }

    let mut deals: Vec<DealResult> = merged.into_values().collect();
    for deal in &mut deals {
        let hits = term_hits
            .get(&deal.offer.offer_id)
            .copied()
            .unwrap_or(1);
        let multiplier =
            (1.0 + TERM_BONUS_STEP * hits.saturating_sub(1) as f32).min(TERM_BONUS_CAP);
        deal.score *= multiplier;
    }

    deals.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| {
            a.offer
                .name
                .len()
                .cmp(&b.offer.name.len())
                .then_with(|| a.offer.offer_id.cmp(&b.offer.offer_id))
        })
    });

    if let Some(top) = deals.first().map(|d| d.score) {
        let cutoff = top * MERGED_CUTOFF;
        deals.retain(|d| d.score >= cutoff);
    }

    deals.truncate(top_k);
    deals
}
