//! Local sentence-transformer embeddings via fastembed.
//!
//! Models are downloaded on first use from Hugging Face and cached; after
//! that, embedding runs entirely offline.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::{TextEmbedder, EMBEDDING_DIMENSION};
use crate::error::{Result, TruthscanError};

const MODEL_NAME: &str = "all-minilm-l6-v2";

/// all-MiniLM-L6-v2 embedder (384 dimensions).
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Load the model, downloading it if it is not cached yet.
    pub fn new() -> Result<Self> {
        info!(model = MODEL_NAME, "Loading sentence embedding model");
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
        )
        .map_err(|e| {
            TruthscanError::EmbeddingError(format!(
                "Failed to initialize local embedding model: {}",
                e
            ))
        })?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl TextEmbedder for FastEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| TruthscanError::EmbeddingError("Embedding model lock poisoned".into()))?;

        let mut embeddings = model
            .embed(vec![text], None)
            .map_err(|e| TruthscanError::EmbeddingError(format!("Local embedding failed: {}", e)))?;

        embeddings
            .pop()
            .ok_or_else(|| TruthscanError::EmbeddingError("Empty embedding response".into()))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
