//! Shared fixtures for integration tests: a small catalog covering the
//! main search scenarios and a deterministic embedding backend.
#![allow(dead_code)]

use std::sync::Arc;

use dealdex::catalog::Catalog;
use dealdex::embedding::{l2_normalize, EmbeddingError, EmbeddingProvider};
use dealdex::index::SearchIndex;
use dealdex::search::{SearchEngine, SearchOptions};

/// Deterministic bag-of-words embedder: every lowercased token bumps one
/// of 384 hash buckets, rows are unit-normalized. Texts sharing tokens
/// get positive cosine similarity; no model download, no randomness.
pub struct BagOfWordsEmbedder;

const DIM: usize = 384;

fn bucket(token: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in token.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % DIM as u64) as usize
}

impl EmbeddingProvider for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0; DIM];
        for token in text.to_lowercase().split_whitespace() {
            v[bucket(token)] += 1.0;
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "bag-of-words-test"
    }
}

const DEALS: &str = r#"[
    {"offerId": "D1", "name": "Milk Sale", "offerPrice": "$1.00 OFF", "category": "Dairy"},
    {"offerId": "D2", "name": "Dairy Savings", "description": "Save on dairy essentials", "offerPrice": "$1.50 OFF"},
    {"offerId": "D3", "name": "Chocolate Treats", "offerPrice": "$2.00 OFF"},
    {"offerId": "D4", "name": "Fresh Bread", "description": "Save on bakery bread", "category": "Bakery"},
    {"offerId": "D5", "name": "Cereal Deals", "offerPrice": "$1.00 OFF"},
    {"offerId": "D6", "name": "Lotion Special", "offerPrice": "$3.00 OFF"},
    {"offerId": "D7", "name": "Wine Special", "description": "Save on select wines", "category": "Wine, Beer & Spirits", "offerPrice": "$3.00 OFF"},
    {"offerId": "D8", "name": "Beer Deal", "category": "Wine, Beer & Spirits", "offerPrice": "$5.00 REBATE"},
    {"offerId": "D9", "name": "Oatmilk Offer", "offerPrice": "$1.50 OFF"},
    {"offerId": "D10", "name": "Candy Bonanza", "offerPrice": "$2.00 OFF"},
    {"offerId": "D11", "name": "XYZAL Allergy Relief", "offerPrice": "$4.00 OFF"},
    {"offerId": "D12", "name": "Coffee Sale", "offerPrice": "$2.00 OFF"}
]"#;

const PRODUCTS: &str = r#"[
    {"offerId": "D1", "name": "Whole Milk 1 Gallon", "price": 3.99, "departmentName": "Dairy", "shelfName": "Milk", "aisleLocation": "Aisle 1"},
    {"offerId": "D1", "name": "2% Reduced Fat Milk", "price": 4.29, "departmentName": "Dairy", "shelfName": "Milk", "aisleLocation": "Aisle 1"},
    {"offerId": "D2", "name": "Organic Whole Milk Half Gallon", "price": 5.49, "departmentName": "Dairy", "shelfName": "Milk"},
    {"offerId": "D2", "name": "Cheddar Cheese Block", "price": 6.99, "departmentName": "Dairy", "shelfName": "Cheese"},
    {"offerId": "D3", "name": "Dark Chocolate Bar", "price": 2.99, "departmentName": "Cookies, Snacks & Candy", "shelfName": "Chocolate"},
    {"offerId": "D3", "name": "Chocolate Milk Drink 16oz", "price": 1.99, "departmentName": "Dairy", "shelfName": "Flavored Milk"},
    {"offerId": "D5", "name": "Corn Flakes 18oz", "price": 4.49, "departmentName": "Breakfast & Cereal", "shelfName": "Cereal"},
    {"offerId": "D6", "name": "Hand Lotion 8oz", "price": 7.99, "departmentName": "Personal Care", "shelfName": "Lotion", "aisleLocation": "Aisle 7"},
    {"offerId": "D7", "name": "Chardonnay 750ml", "price": 12.99, "departmentName": "Wine, Beer & Spirits", "shelfName": "White Wine"},
    {"offerId": "D8", "name": "Craft IPA 6-Pack", "price": 9.99, "departmentName": "Wine, Beer & Spirits", "shelfName": "Craft Beer"},
    {"offerId": "D9", "name": "Planet Oat Oatmilk 64oz", "price": 4.49, "departmentName": "Dairy", "shelfName": "Milk Alternatives"},
    {"offerId": "D10", "name": "Milk Chocolate Truffles", "price": 5.99, "departmentName": "Cookies, Snacks & Candy", "shelfName": "Chocolate"},
    {"offerId": "D10", "name": "Gummy Bears", "price": 3.49, "departmentName": "Cookies, Snacks & Candy", "shelfName": "Candy"},
    {"offerId": "D10", "name": "Sour Patch Kids", "price": 3.99, "departmentName": "Cookies, Snacks & Candy", "shelfName": "Candy"},
    {"offerId": "D10", "name": "Jelly Beans", "price": 2.99, "departmentName": "Cookies, Snacks & Candy", "shelfName": "Candy"},
    {"offerId": "D11", "name": "Xyzal Allergy Tablets 80ct", "price": 21.99, "departmentName": "Health & Wellness", "shelfName": "Allergy"},
    {"offerId": "D12", "name": "Ground Coffee 12oz", "price": 8.99, "departmentName": "Beverages", "shelfName": "Coffee"}
]"#;

pub fn fixture_catalog() -> Catalog {
    Catalog::from_json(DEALS, PRODUCTS).expect("fixture catalog")
}

pub fn fixture_index() -> SearchIndex {
    SearchIndex::build(fixture_catalog(), Some(&BagOfWordsEmbedder), None, 32)
        .expect("fixture index")
}

pub fn fixture_engine() -> SearchEngine {
    SearchEngine::new(Arc::new(fixture_index()), Some(Arc::new(BagOfWordsEmbedder)))
}

pub fn fixture_engine_with(options: SearchOptions) -> SearchEngine {
    SearchEngine::with_options(
        Arc::new(fixture_index()),
        Some(Arc::new(BagOfWordsEmbedder)),
        options,
    )
}
