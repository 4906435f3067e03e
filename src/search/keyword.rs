//! Field-weighted keyword scoring
//!
//! Every query word must appear somewhere in a record's combined text
//! for it to score at all. Matches are then weighted by where they land
//! (offer name > product name > descriptions > everything else), with a
//! bonus for whole-word hits over substring hits. Contributions are
//! summed per (word, field), so multi-field and multi-word coverage both
//! raise the score; the ranker normalizes by the per-query max.

use crate::catalog::SearchRecord;
use crate::index::SearchIndex;

const OFFER_NAME_WEIGHT: f32 = 3.0;
const PRODUCT_NAME_WEIGHT: f32 = 2.0;
const DESCRIPTION_WEIGHT: f32 = 1.0;
const OTHER_FIELD_WEIGHT: f32 = 0.5;
const WHOLE_WORD_BONUS: f32 = 1.5;

/// Score every record for the lowercased query words.
///
/// Returns a dense vector over the full record space; records missing
/// any query word score 0.
pub(crate) fn score_records(words: &[String], index: &SearchIndex) -> Vec<f32> {
    let mut scores = vec![0.0; index.record_count()];
    if words.is_empty() {
        return scores;
    }

    for (i, record) in index.records().iter().enumerate() {
        if !words.iter().all(|w| record.text.contains(w.as_str())) {
            continue;
        }
        scores[i] = score_record(words, record);
    }
    scores
}

fn score_record(words: &[String], record: &SearchRecord) -> f32 {
    let weighted_fields: [(&str, f32); 8] = [
        (&record.offer_name, OFFER_NAME_WEIGHT),
        (&record.product_name, PRODUCT_NAME_WEIGHT),
        (&record.offer_description, DESCRIPTION_WEIGHT),
        (&record.product_description, DESCRIPTION_WEIGHT),
        (&record.category, OTHER_FIELD_WEIGHT),
        (&record.department, OTHER_FIELD_WEIGHT),
        (&record.aisle, OTHER_FIELD_WEIGHT),
        (&record.shelf, OTHER_FIELD_WEIGHT),
    ];

    let mut total = 0.0;
    for word in words {
        for (field, weight) in weighted_fields {
            if field.contains(word.as_str()) {
                let bonus = if contains_whole_word(field, word) {
                    WHOLE_WORD_BONUS
                } else {
                    1.0
                };
                total += weight * bonus;
            }
        }
    }
    total
}

/// Token-bounded occurrence: the word appears with no alphanumeric
/// character directly on either side.
fn contains_whole_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let step = word.chars().next().map_or(1, char::len_utf8);
    let mut from = 0;
    while let Some(rel) = text[from..].find(word) {
        let start = from + rel;
        let end = start + word.len();
        let left_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let right_ok = text[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        from = start + step;
    }
    false
}
