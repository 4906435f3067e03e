//! Configuration for paths, the embedding backend, and search tunables
//!
//! TOML-backed with full defaults: a missing file or section falls back
//! to values that match the engine's standard behavior.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DealdexError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Snapshot and cache locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub deals_path: PathBuf,
    pub products_path: PathBuf,
    pub cache_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            deals_path: PathBuf::from("deals.json"),
            products_path: PathBuf::from("qualifying-products.json"),
            cache_dir: PathBuf::from("cache"),
        }
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name (e.g. "all-MiniLM-L6-v2")
    pub model: String,
    /// Embedding dimension (384 for MiniLM)
    pub dimension: usize,
    /// Records embedded per batch
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 32,
        }
    }
}

/// Query-path tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    pub stream_batch_size: usize,
    /// Raw fuzzy cutoff on the 0-100 scale
    pub fuzzy_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 40,
            stream_batch_size: 5,
            fuzzy_threshold: 60.0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DealdexError::Io {
            source,
            context: format!("failed to read config file {}", path.display()),
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(DealdexError::Config(
                "embedding.dimension must be non-zero".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(DealdexError::Config(
                "embedding.batch_size must be non-zero".to_string(),
            ));
        }
        if self.search.top_k == 0 {
            return Err(DealdexError::Config(
                "search.top_k must be non-zero".to_string(),
            ));
        }
        if self.search.stream_batch_size == 0 {
            return Err(DealdexError::Config(
                "search.stream_batch_size must be non-zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.search.fuzzy_threshold) {
            return Err(DealdexError::Config(
                "search.fuzzy_threshold must be within 0-100".to_string(),
            ));
        }
        Ok(())
    }

    /// Location of the binary embedding cache.
    pub fn embeddings_cache_path(&self) -> PathBuf {
        self.data.cache_dir.join("embeddings.bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.search.top_k, 40);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            top_k = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.search.top_k, 10);
        assert_eq!(config.search.stream_batch_size, 5);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn zero_top_k_fails_validation() {
        let mut config = Config::default();
        config.search.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_fuzzy_threshold_fails() {
        let mut config = Config::default();
        config.search.fuzzy_threshold = 140.0;
        assert!(config.validate().is_err());
    }
}
