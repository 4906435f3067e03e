//! Row-major embedding matrix with unit-normalized rows

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(usize),

    #[error("Row length mismatch: expected {expected}, got {actual}")]
    RowLength { expected: usize, actual: usize },

    #[error("Data length {len} is not a multiple of dimension {dim}")]
    RaggedData { len: usize, dim: usize },
}

/// Dense `(rows, dim)` matrix of record embeddings.
///
/// Every row is L2-normalized on construction, so cosine similarity
/// against a unit query vector is a plain dot product.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dim: usize,
}

impl EmbeddingMatrix {
    /// Empty matrix of the given dimension (zero rows).
    pub fn empty(dim: usize) -> Result<Self, MatrixError> {
        Self::from_raw(Vec::new(), dim)
    }

    /// Build from per-record rows, normalizing each.
    pub fn from_rows(rows: Vec<Vec<f32>>, dim: usize) -> Result<Self, MatrixError> {
        if dim == 0 {
            return Err(MatrixError::InvalidDimension(dim));
        }
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(MatrixError::RowLength {
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_raw(data, dim)
    }

    /// Build from a flat row-major buffer, normalizing each row.
    pub fn from_raw(mut data: Vec<f32>, dim: usize) -> Result<Self, MatrixError> {
        if dim == 0 {
            return Err(MatrixError::InvalidDimension(dim));
        }
        if data.len() % dim != 0 {
            return Err(MatrixError::RaggedData {
                len: data.len(),
                dim,
            });
        }
        for row in data.chunks_mut(dim) {
            l2_normalize(row);
        }
        Ok(Self { data, dim })
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Scale a vector to unit length. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Dot product of two equal-length vectors.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
