//! On-disk embedding cache
//!
//! Binary layout, little-endian:
//! `record_count: u32 | dim: u32 | hash: [u8; 32] | data: f32 × (count · dim)`.
//! The hash is the SHA-256 of the UTF-8 record texts joined by '\n'; a
//! mismatch means the snapshots changed and the matrix must be recomputed.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::matrix::{EmbeddingMatrix, MatrixError};

const HEADER_LEN: usize = 4 + 4 + 32;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache IO error at {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("cache at {path} is truncated or malformed")]
    Malformed { path: PathBuf },

    #[error("cache payload invalid: {0}")]
    InvalidPayload(#[from] MatrixError),
}

/// A cache payload read back from disk.
pub struct CachedEmbeddings {
    pub hash: [u8; 32],
    pub matrix: EmbeddingMatrix,
}

impl CachedEmbeddings {
    /// Whether this payload can serve the given record set exactly.
    pub fn matches(&self, hash: &[u8; 32], record_count: usize, dim: usize) -> bool {
        self.hash == *hash && self.matrix.rows() == record_count && self.matrix.dim() == dim
    }

    /// Whether the payload at least has the right shape (stale-cache
    /// fallback when the embedding backend is unavailable).
    pub fn shape_matches(&self, record_count: usize, dim: usize) -> bool {
        self.matrix.rows() == record_count && self.matrix.dim() == dim
    }
}

/// SHA-256 over the ordered record texts joined by '\n'.
pub fn content_hash(texts: &[String]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (i, text) in texts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(text.as_bytes());
    }
    hasher.finalize().into()
}

pub fn load(path: &Path) -> Result<CachedEmbeddings, CacheError> {
    let bytes = std::fs::read(path).map_err(|source| CacheError::Io {
        source,
        path: path.to_path_buf(),
    })?;

    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Malformed {
            path: path.to_path_buf(),
        });
    }

    let record_count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let dim = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes[8..HEADER_LEN]);

    let expected_len = HEADER_LEN + record_count.saturating_mul(dim).saturating_mul(4);
    if dim == 0 || bytes.len() != expected_len {
        return Err(CacheError::Malformed {
            path: path.to_path_buf(),
        });
    }

    let data: Vec<f32> = bytes[HEADER_LEN..]
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let matrix = EmbeddingMatrix::from_raw(data, dim)?;
    Ok(CachedEmbeddings { hash, matrix })
}

pub fn save(path: &Path, hash: &[u8; 32], matrix: &EmbeddingMatrix) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            source,
            path: parent.to_path_buf(),
        })?;
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + matrix.data().len() * 4);
    bytes.extend_from_slice(&(matrix.rows() as u32).to_le_bytes());
    bytes.extend_from_slice(&(matrix.dim() as u32).to_le_bytes());
    bytes.extend_from_slice(hash);
    for value in matrix.data() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    std::fs::write(path, bytes).map_err(|source| CacheError::Io {
        source,
        path: path.to_path_buf(),
    })
}
