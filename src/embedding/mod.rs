//! Embedding generation, the record embedding matrix, and its disk cache
//!
//! Architecture:
//! - `EmbeddingProvider` trait for backend abstraction
//! - `FastEmbedProvider` for local embedding (all-MiniLM-L6-v2, 384-dim)
//! - `EmbeddingMatrix` with unit rows so cosine similarity is a dot product
//! - Content-hashed binary cache, recomputed transparently on mismatch

pub mod cache;
mod matrix;
mod provider;

pub use cache::{CacheError, CachedEmbeddings};
pub use matrix::{l2_normalize, EmbeddingMatrix, MatrixError};
pub(crate) use matrix::dot;
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
