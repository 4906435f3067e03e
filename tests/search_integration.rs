//! End-to-end search behavior over the fixture catalog: gate, ranking,
//! typo recovery, grouping invariants, streaming, and multi-term merge.

mod common;

use common::{fixture_engine, fixture_engine_with};
use dealdex::search::{DealResult, SearchOptions};

#[tokio::test]
async fn gibberish_queries_return_empty() {
    let engine = fixture_engine();
    for query in ["abcd", "asdf", "qwerty", "zzzzz"] {
        let results = engine.search(query, 40).await;
        assert!(
            results.is_empty(),
            "'{query}' is gibberish but returned {} results",
            results.len()
        );
    }
}

#[tokio::test]
async fn xyz_matches_xyzal_not_gibberish() {
    // "xyz" is a real substring of the XYZAL deal, not gibberish.
    let engine = fixture_engine();
    let results = engine.search("xyz", 40).await;
    assert!(!results.is_empty());
    assert_eq!(results[0].offer.offer_id, "D11");
}

#[tokio::test]
async fn corpus_words_pass_the_gate() {
    let engine = fixture_engine();
    for word in ["milk", "cheddar", "gummy", "chardonnay", "oatmilk", "bread"] {
        let results = engine.search(word, 40).await;
        assert!(!results.is_empty(), "'{word}' should pass the gibberish gate");
    }
}

#[tokio::test]
async fn chocolate_ranks_the_chocolate_deal_first() {
    let engine = fixture_engine();
    let results = engine.search("chocolate", 40).await;
    assert!(!results.is_empty());
    assert!(results[0].offer.name.to_lowercase().contains("chocolate"));
    assert!(results[0].score > 0.8);
}

#[tokio::test]
async fn milk_in_offer_name_ranks_first() {
    let engine = fixture_engine();
    let results = engine.search("milk", 40).await;
    assert!(results.len() >= 2);
    assert_eq!(results[0].offer.offer_id, "D1");
    assert!(results[0].offer.name.to_lowercase().contains("milk"));
}

#[tokio::test]
async fn multi_word_query_requires_every_word() {
    let engine = fixture_engine();
    let results = engine.search("corn flakes", 40).await;
    assert!(!results.is_empty());
    assert_eq!(results[0].offer.offer_id, "D5");
}

#[tokio::test]
async fn typo_queries_recover_their_deals() {
    let engine = fixture_engine();

    let choclate = engine.search("choclate", 40).await;
    assert!(!choclate.is_empty());
    assert!(choclate[0].offer.name.to_lowercase().contains("chocolate"));

    let logion = engine.search("logion", 40).await;
    assert!(!logion.is_empty());
    assert!(logion
        .iter()
        .any(|d| d.offer.name.to_lowercase().contains("lotion")));

    let coffe = engine.search("coffe", 40).await;
    assert!(!coffe.is_empty());
    assert!(coffe[0].offer.name.to_lowercase().contains("coffee"));
}

#[tokio::test]
async fn correct_spelling_beats_the_typo() {
    let engine = fixture_engine();
    for (correct, typo) in [("chocolate", "choclate"), ("lotion", "logion"), ("coffee", "coffe")] {
        let correct_results = engine.search(correct, 40).await;
        let typo_results = engine.search(typo, 40).await;
        assert!(!typo_results.is_empty(), "'{typo}' should recover results");
        assert!(
            correct_results.len() >= typo_results.len(),
            "'{correct}' returned fewer deals than '{typo}'"
        );
        assert!(
            correct_results[0].score >= typo_results[0].score,
            "'{correct}' should outscore '{typo}'"
        );
    }
}

#[tokio::test]
async fn results_are_sorted_unique_and_consistent() {
    let engine = fixture_engine();
    for query in ["milk", "chocolate", "wine", "lotion", "cheddar"] {
        let results = engine.search(query, 40).await;

        let mut last = f32::INFINITY;
        for deal in &results {
            assert!(deal.score <= last, "'{query}' results not sorted");
            last = deal.score;
        }

        let ids: Vec<&str> = results.iter().map(|d| d.offer.offer_id.as_str()).collect();
        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(ids.len(), unique.len(), "'{query}' returned duplicate deals");

        for deal in &results {
            assert!(deal.score > 0.0);
            assert!(!deal.score_components.sources().is_empty());
            for matched in &deal.matching_products {
                assert_eq!(
                    matched.product.offer_id, deal.offer.offer_id,
                    "product '{}' grouped under the wrong deal",
                    matched.product.name
                );
                assert!(matched.score > 0.0);
            }
        }
    }
}

#[tokio::test]
async fn adaptive_cutoff_bounds_the_tail() {
    let engine = fixture_engine();
    for query in ["milk", "chocolate", "logion"] {
        let results = engine.search(query, 40).await;
        if results.is_empty() {
            continue;
        }
        let top = results[0].score;
        let ratio = if top >= 0.5 { 0.4 } else { 0.7 };
        for deal in &results {
            assert!(
                deal.score >= top * ratio - 1e-6,
                "'{query}': {} below the {ratio} cutoff of top {top}",
                deal.score
            );
        }
    }
}

#[tokio::test]
async fn wine_in_name_outranks_wine_in_category() {
    let engine = fixture_engine();
    let results = engine.search("wine", 40).await;
    assert_eq!(results[0].offer.offer_id, "D7");
    if let Some(d8) = results.iter().find(|d| d.offer.offer_id == "D8") {
        assert!(results[0].score > d8.score);
    }
}

#[tokio::test]
async fn dense_match_outranks_sparse_match() {
    // D3 matches "chocolate" with 2 of 2 products, D10 with 1 of 4.
    let engine = fixture_engine();
    let results = engine.search("chocolate", 40).await;
    let d3 = results.iter().find(|d| d.offer.offer_id == "D3");
    assert!(d3.is_some(), "Chocolate Treats should match");
    if let (Some(d3), Some(d10)) = (d3, results.iter().find(|d| d.offer.offer_id == "D10")) {
        assert!(d3.score > d10.score);
    }
}

#[tokio::test]
async fn offer_only_deal_matches_with_no_products() {
    let engine = fixture_engine();
    let results = engine.search("bread", 40).await;
    let d4 = results.iter().find(|d| d.offer.offer_id == "D4");
    let d4 = d4.expect("Fresh Bread should match by name");
    assert!(d4.matching_products.is_empty());
}

#[tokio::test]
async fn matching_products_explain_the_match() {
    let engine = fixture_engine();
    let results = engine.search("cheddar", 40).await;
    let d2 = results
        .iter()
        .find(|d| d.offer.offer_id == "D2")
        .expect("Dairy Savings should match via its cheddar product");
    assert!(d2
        .matching_products
        .iter()
        .any(|m| m.product.name.contains("Cheddar")));
}

#[tokio::test]
async fn top_k_limits_the_result_count() {
    let engine = fixture_engine();
    let results = engine.search("milk", 1).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].offer.offer_id, "D1");
}

#[tokio::test]
async fn empty_query_is_not_an_error() {
    let engine = fixture_engine();
    assert!(engine.search("", 40).await.is_empty());
    assert!(engine.search("   \t ", 40).await.is_empty());
}

#[tokio::test]
async fn stream_batches_are_bounded_and_monotonic() {
    let engine = fixture_engine_with(SearchOptions {
        stream_batch_size: 1,
        ..SearchOptions::default()
    });

    let direct = engine.search("milk", 40).await;
    let batches: Vec<Vec<DealResult>> = engine.search_stream("milk", 40).await.collect();

    assert!(batches.len() >= 2, "expected multiple single-deal batches");
    for batch in &batches {
        assert_eq!(batch.len(), 1);
    }

    let streamed: Vec<&DealResult> = batches.iter().flatten().collect();
    assert_eq!(streamed.len(), direct.len());
    for (streamed, direct) in streamed.iter().zip(&direct) {
        assert_eq!(streamed.offer.offer_id, direct.offer.offer_id);
    }
}

#[tokio::test]
async fn expanded_terms_merge_and_dedup() {
    let engine = fixture_engine();
    let terms = vec!["milk".to_string(), "cheddar".to_string()];
    let results = engine.search_expanded(&terms, 40).await;

    let ids: Vec<&str> = results.iter().map(|d| d.offer.offer_id.as_str()).collect();
    assert!(ids.contains(&"D1"));
    assert!(ids.contains(&"D2"));

    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(ids.len(), unique.len());
}

#[tokio::test]
async fn expanded_gibberish_terms_merge_to_nothing() {
    let engine = fixture_engine();
    let terms = vec!["abcd".to_string(), "qwerty".to_string()];
    assert!(engine.search_expanded(&terms, 40).await.is_empty());
}
