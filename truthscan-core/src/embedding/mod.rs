//! Text embedding sources.
//!
//! The similarity index never computes embeddings itself; it asks a
//! [`TextEmbedder`] for a fixed-dimension vector per input string.
//!
//! - **[`HashingEmbedder`]** - signed feature hashing over word tokens, fully
//!   offline and dependency-free at runtime. The default.
//! - **[`FastEmbedder`]** - all-MiniLM-L6-v2 sentence embeddings through
//!   fastembed (requires the `fastembed` feature; downloads the model on
//!   first use).
//!
//! Both produce [`EMBEDDING_DIMENSION`]-dimensional, L2-normalised vectors so
//! the index's distance-to-similarity conversion applies to either.

mod hashing;
#[cfg(feature = "fastembed")]
mod local;

pub use hashing::HashingEmbedder;
#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;

use crate::error::Result;

/// Dimension of every embedding produced by the bundled embedders.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Trait for text embedding sources.
///
/// Implementations must be deterministic: identical input yields an
/// identical vector. They must also be thread-safe (`Send + Sync`).
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a vector of length [`dimension`](Self::dimension).
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector dimensionality.
    fn dimension(&self) -> usize;

    /// Model identifier, recorded in logs.
    fn model_name(&self) -> &str;
}

/// Scale `vector` to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
