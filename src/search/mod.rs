//! Hybrid search: three scorers fused into one deal-level ranking
//!
//! The three scorers are disjoint by design — keyword for exact matches,
//! fuzzy for typos, semantic for meaning — and each returns a dense
//! score vector over the record space. The ranker fuses them into
//! composite scores, groups records into deals, and trims the tail with
//! an adaptive cutoff. `SearchEngine` is the query-facing surface.

mod engine;
mod fuzzy;
mod keyword;
mod ranker;
mod semantic;

pub use engine::{ResultBatches, SearchEngine, SearchOptions};
pub use ranker::{DealResult, ProductMatch, ScoreComponents};
