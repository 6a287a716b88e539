//! Signed feature-hashing embedder.
//!
//! Each lower-cased alphanumeric token is hashed with SHA3-256. The first four
//! digest bytes pick a bucket, the low bit of the fifth picks the sign. The
//! bucket counts are then L2-normalised, so two texts sharing most of their
//! words land close together while unrelated texts are near-orthogonal.

use sha3::{Digest, Sha3_256};

use super::{l2_normalize, TextEmbedder, EMBEDDING_DIMENSION};
use crate::error::Result;

/// Offline embedder based on signed feature hashing.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIMENSION,
        }
    }
}

impl HashingEmbedder {
    /// Create an embedder with the standard 384 dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an embedder with a custom dimension (must be non-zero).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

/// Split text into lower-cased alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

impl TextEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let digest = Sha3_256::digest(token.as_bytes());
            let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize
                % self.dimension;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "sha3-feature-hashing"
    }
}
