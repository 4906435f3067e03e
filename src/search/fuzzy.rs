//! Fuzzy string scoring for typo recovery
//!
//! Substring-alignment ratio (rapidfuzz `partial_ratio`) of the query
//! against offer and product names, best of the two per record. Raw
//! scores live on a 0-100 scale; everything below the threshold is
//! dropped and the rest is normalized to [0, 1] here, at the scorer
//! boundary, so downstream arithmetic never sees the raw scale.

use rapidfuzz::fuzz;

use crate::index::SearchIndex;

/// Minimum raw partial-ratio for a record to count as fuzzy-matched.
pub(crate) const DEFAULT_THRESHOLD: f64 = 60.0;

/// Score every record for the lowercased query. Dense over the record
/// space; values are normalized to [0, 1] with sub-threshold matches at 0.
pub(crate) fn score_records(query: &str, index: &SearchIndex, threshold: f64) -> Vec<f32> {
    if query.is_empty() {
        return vec![0.0; index.record_count()];
    }

    index
        .records()
        .iter()
        .map(|record| {
            let mut best = fuzz::partial_ratio(query.chars(), record.offer_name.chars());
            if !record.product_name.is_empty() {
                best = best.max(fuzz::partial_ratio(
                    query.chars(),
                    record.product_name.chars(),
                ));
            }
            if best < threshold {
                0.0
            } else {
                (best / 100.0) as f32
            }
        })
        .collect()
}
