//! Deal and product data model
//!
//! Offers (deals) and their qualifying products are loaded once from two
//! JSON snapshots and are immutable for the process lifetime. Snapshot
//! keys are snake_case with camelCase aliases so both export formats
//! parse identically.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

mod loader;
mod record;

pub use loader::{Catalog, LoadError};
pub(crate) use record::build_records;
pub use record::SearchRecord;

/// Promotional program an offer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OfferProgram {
    /// Manufacturer coupon
    MF,
    /// Personalized deal
    PD,
    /// Store coupon
    SC,
    /// Loyalty offer
    LO,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Broad deal category derived from the offer price label
///
/// Snapshots may carry it explicitly; otherwise it is classified from
/// the free-form price text ("$2.00 OFF", "FREE", "$1.99 per lb", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DealType {
    Rebate,
    Free,
    PerPound,
    Points,
    DollarOff,
    FixedPrice,
    Other,
    #[default]
    #[serde(other)]
    Unclassified,
}

fn fixed_price_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$[\d.]+$").expect("literal pattern"))
}

impl DealType {
    /// Classify a free-form offer price label into a deal type.
    pub fn classify(offer_price: &str) -> Self {
        let label = offer_price.to_lowercase();
        let label = label.trim();
        if label.contains("rebate") {
            DealType::Rebate
        } else if label.contains("free") {
            DealType::Free
        } else if label.contains("per lb") {
            DealType::PerPound
        } else if label.contains("points") {
            DealType::Points
        } else if label.contains("off") || label.starts_with("save") {
            DealType::DollarOff
        } else if label.contains("each")
            || label.contains("for ")
            || fixed_price_pattern().is_match(label)
        {
            DealType::FixedPrice
        } else {
            DealType::Other
        }
    }
}

/// A promotional deal, the unit surfaced in search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    #[serde(alias = "offerId")]
    pub offer_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Free-form price label ("$2.00 OFF", "FREE", "$4.99")
    #[serde(default, alias = "offerPrice")]
    pub offer_price: String,

    #[serde(default, alias = "offerPgm")]
    pub offer_pgm: OfferProgram,

    #[serde(default, alias = "dealType")]
    pub deal_type: DealType,

    /// Validity window, epoch milliseconds
    #[serde(
        default,
        alias = "startDate",
        deserialize_with = "deserialize_epoch_ms"
    )]
    pub start_date: Option<i64>,

    #[serde(default, alias = "endDate", deserialize_with = "deserialize_epoch_ms")]
    pub end_date: Option<i64>,

    #[serde(default, alias = "image", alias = "imageUrl")]
    pub image_url: String,
}

/// A product qualifying for an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "offerId")]
    pub offer_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, alias = "departmentName")]
    pub department: String,

    #[serde(default, alias = "aisleLocation")]
    pub aisle: String,

    #[serde(default, alias = "shelfName")]
    pub shelf: String,

    #[serde(default, alias = "memberPrice", alias = "price")]
    pub member_price: Option<f64>,

    #[serde(default, alias = "basePrice")]
    pub base_price: Option<f64>,

    #[serde(default, alias = "imageUrl")]
    pub image_url: String,
}

/// Accept epoch-ms timestamps as integers or numeric strings.
fn deserialize_epoch_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EpochMs {
        Int(i64),
        Text(String),
    }

    match Option::<EpochMs>::deserialize(deserializer)? {
        None => Ok(None),
        Some(EpochMs::Int(ms)) => Ok(Some(ms)),
        Some(EpochMs::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else {
                text.parse::<i64>().map(Some).map_err(|_| {
                    serde::de::Error::custom(format!("invalid epoch-ms timestamp: {text:?}"))
                })
            }
        }
    }
}
