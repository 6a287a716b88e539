//! Exhaustive squared-L2 index over contiguous `f32` storage.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TruthscanError};

/// Format tag written into every index file.
const INDEX_FORMAT: &str = "truthscan-flat-l2";

/// Current on-disk index layout version.
const INDEX_FORMAT_VERSION: u32 = 1;

/// Flat (non-approximate) vector index.
///
/// Vectors are stored back to back; vector `i` occupies
/// `vectors[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

/// Serialized form of a [`FlatIndex`].
#[derive(Serialize, Deserialize)]
struct IndexFile {
    format: String,
    version: u32,
    dimension: usize,
    ntotal: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn ntotal(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    /// Append one vector.
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        self.check_dimension(vector)?;
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Return up to `k` (squared distance, position) pairs, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        self.check_dimension(query)?;
        if k == 0 || self.dimension == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, stored)| (squared_l2(query, stored), i))
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Serialize to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let file = IndexFile {
            format: INDEX_FORMAT.to_string(),
            version: INDEX_FORMAT_VERSION,
            dimension: self.dimension,
            ntotal: self.ntotal(),
            vectors: self.vectors.clone(),
        };
        let mut bytes = Vec::new();
        ciborium::into_writer(&file, &mut bytes)
            .map_err(|e| TruthscanError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize from CBOR bytes, validating the header and layout.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let file: IndexFile = ciborium::from_reader(bytes)
            .map_err(|e| TruthscanError::IndexLoad(format!("corrupt index file: {}", e)))?;

        if file.format != INDEX_FORMAT {
            return Err(TruthscanError::IndexLoad(format!(
                "unexpected index format: {}",
                file.format
            )));
        }
        if file.version != INDEX_FORMAT_VERSION {
            return Err(TruthscanError::IndexLoad(format!(
                "unsupported index version: {}",
                file.version
            )));
        }
        if file.dimension == 0 || file.vectors.len() != file.dimension * file.ntotal {
            return Err(TruthscanError::IndexLoad(format!(
                "index layout mismatch: dimension={}, ntotal={}, values={}",
                file.dimension,
                file.ntotal,
                file.vectors.len()
            )));
        }

        Ok(Self {
            dimension: file.dimension,
            vectors: file.vectors,
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(TruthscanError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
