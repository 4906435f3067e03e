//! Searchable record construction
//!
//! Search operates over flat records, one per (offer, product) pair plus
//! one per offer with no qualifying products. Every scored field is
//! lowercased once here so the query path never repeats that work.

use super::{Catalog, Offer, Product};

/// The flat unit the scorers operate on.
///
/// Field text is pre-lowercased; original-case data lives on the
/// referenced `Offer`/`Product`. `embed_text` keeps original case (the
/// embedding model is case-tolerant).
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub offer_index: usize,
    pub product_index: Option<usize>,
    pub offer_id: String,

    /// Original-case concatenation fed to the embedding model
    pub embed_text: String,
    /// Lowercased concatenation of every scored field
    pub text: String,

    pub offer_name: String,
    pub product_name: String,
    pub offer_description: String,
    pub product_description: String,
    pub category: String,
    pub department: String,
    pub aisle: String,
    pub shelf: String,
}

impl SearchRecord {
    fn new(
        offer_index: usize,
        offer: &Offer,
        product_index: Option<usize>,
        product: Option<&Product>,
    ) -> Self {
        let product_name = product.map(|p| p.name.as_str()).unwrap_or("");
        let product_description = product.map(|p| p.description.as_str()).unwrap_or("");
        let department = product.map(|p| p.department.as_str()).unwrap_or("");
        let aisle = product.map(|p| p.aisle.as_str()).unwrap_or("");
        let shelf = product.map(|p| p.shelf.as_str()).unwrap_or("");

        let text = join_fields(&[
            &offer.name,
            product_name,
            &offer.description,
            product_description,
            &offer.category,
            department,
            aisle,
            shelf,
        ])
        .to_lowercase();

        let embed_text = join_fields(&[
            &offer.name,
            &offer.description,
            &offer.category,
            product_name,
            product_description,
            department,
        ]);

        Self {
            offer_index,
            product_index,
            offer_id: offer.offer_id.clone(),
            embed_text,
            text,
            offer_name: offer.name.to_lowercase(),
            product_name: product_name.to_lowercase(),
            offer_description: offer.description.to_lowercase(),
            product_description: product_description.to_lowercase(),
            category: offer.category.to_lowercase(),
            department: department.to_lowercase(),
            aisle: aisle.to_lowercase(),
            shelf: shelf.to_lowercase(),
        }
    }

    /// Whether this record stands in for a product-less offer.
    pub fn is_offer_only(&self) -> bool {
        self.product_index.is_none()
    }
}

fn join_fields(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten the catalog into records, one per (offer, product) pair and
/// one per product-less offer. Offer snapshot order drives record order.
pub(crate) fn build_records(catalog: &Catalog) -> Vec<SearchRecord> {
    let mut records = Vec::new();
    for (offer_index, offer) in catalog.offers.iter().enumerate() {
        let product_indices = catalog.products_for(&offer.offer_id);
        if product_indices.is_empty() {
            records.push(SearchRecord::new(offer_index, offer, None, None));
        } else {
            for &product_index in product_indices {
                records.push(SearchRecord::new(
                    offer_index,
                    offer,
                    Some(product_index),
                    Some(&catalog.products[product_index]),
                ));
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"[
                {"offerId": "D1", "name": "Milk Sale", "category": "Dairy"},
                {"offerId": "D2", "name": "Fresh Bread", "description": "Save on bakery bread"}
            ]"#,
            r#"[
                {"offerId": "D1", "name": "Whole Milk", "departmentName": "Dairy", "shelfName": "Milk"},
                {"offerId": "D1", "name": "2% Milk", "departmentName": "Dairy"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn one_record_per_product_plus_offer_only() {
        let records = build_records(&catalog());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].offer_id, "D1");
        assert_eq!(records[1].offer_id, "D1");
        assert_eq!(records[2].offer_id, "D2");
        assert!(records[2].is_offer_only());
    }

    #[test]
    fn records_reference_their_offer() {
        let cat = catalog();
        for record in build_records(&cat) {
            assert_eq!(cat.offers[record.offer_index].offer_id, record.offer_id);
            if let Some(product_index) = record.product_index {
                assert_eq!(cat.products[product_index].offer_id, record.offer_id);
            }
        }
    }

    #[test]
    fn text_is_lowercased_and_combined() {
        let records = build_records(&catalog());
        assert_eq!(records[0].text, "milk sale whole milk dairy dairy milk");
        assert_eq!(records[0].offer_name, "milk sale");
        assert_eq!(records[0].shelf, "milk");
    }

    #[test]
    fn embed_text_keeps_original_case_and_skips_empties() {
        let records = build_records(&catalog());
        assert_eq!(records[0].embed_text, "Milk Sale Dairy Whole Milk Dairy");
        assert_eq!(records[2].embed_text, "Fresh Bread Save on bakery bread");
    }
}
