//! Snapshot loading and the offer/product join

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{DealType, Offer, Product};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("malformed {snapshot} snapshot: {source}")]
    Format {
        source: serde_json::Error,
        snapshot: &'static str,
    },

    #[error("{entity} at index {index} is missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        index: usize,
        field: &'static str,
    },
}

/// The loaded, joined catalog: offers plus their qualifying products.
///
/// Offers keep snapshot order; each offer's products keep snapshot order.
/// This ordering is what makes record indices stable across runs.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub offers: Vec<Offer>,
    pub products: Vec<Product>,
    by_offer: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog from already-parsed offers and products.
    ///
    /// Validates required fields and joins products to offers by
    /// `offer_id`. Products referencing an unknown offer are skipped.
    pub fn new(offers: Vec<Offer>, products: Vec<Product>) -> Result<Self, LoadError> {
        let mut offers = offers;
        for (index, offer) in offers.iter_mut().enumerate() {
            if offer.offer_id.is_empty() {
                return Err(LoadError::MissingField {
                    entity: "offer",
                    index,
                    field: "offer_id",
                });
            }
            if offer.name.is_empty() {
                return Err(LoadError::MissingField {
                    entity: "offer",
                    index,
                    field: "name",
                });
            }
            if offer.deal_type == DealType::Unclassified {
                offer.deal_type = DealType::classify(&offer.offer_price);
            }
        }

        for (index, product) in products.iter().enumerate() {
            if product.offer_id.is_empty() {
                return Err(LoadError::MissingField {
                    entity: "product",
                    index,
                    field: "offer_id",
                });
            }
            if product.name.is_empty() {
                return Err(LoadError::MissingField {
                    entity: "product",
                    index,
                    field: "name",
                });
            }
        }

        let known: HashMap<&str, ()> = offers
            .iter()
            .map(|offer| (offer.offer_id.as_str(), ()))
            .collect();

        let mut by_offer: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, product) in products.iter().enumerate() {
            if !known.contains_key(product.offer_id.as_str()) {
                tracing::debug!(
                    offer_id = %product.offer_id,
                    product = %product.name,
                    "skipping product for unknown offer"
                );
                continue;
            }
            by_offer
                .entry(product.offer_id.clone())
                .or_default()
                .push(index);
        }

        Ok(Self {
            offers,
            products,
            by_offer,
        })
    }

    /// Parse the two snapshots from JSON strings.
    pub fn from_json(deals_json: &str, products_json: &str) -> Result<Self, LoadError> {
        let offers: Vec<Offer> =
            serde_json::from_str(deals_json).map_err(|source| LoadError::Format {
                source,
                snapshot: "deals",
            })?;
        let products: Vec<Product> =
            serde_json::from_str(products_json).map_err(|source| LoadError::Format {
                source,
                snapshot: "qualifying-products",
            })?;
        Self::new(offers, products)
    }

    /// Load the two snapshots from disk.
    pub fn load(deals_path: &Path, products_path: &Path) -> Result<Self, LoadError> {
        let deals = std::fs::read_to_string(deals_path).map_err(|source| LoadError::Io {
            source,
            path: deals_path.to_path_buf(),
        })?;
        let products = std::fs::read_to_string(products_path).map_err(|source| LoadError::Io {
            source,
            path: products_path.to_path_buf(),
        })?;
        let catalog = Self::from_json(&deals, &products)?;
        tracing::info!(
            offers = catalog.offers.len(),
            products = catalog.products.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Indices into `products` for one offer, in snapshot order.
    pub fn products_for(&self, offer_id: &str) -> &[usize] {
        self.by_offer
            .get(offer_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
