use thiserror::Error;

#[derive(Error, Debug)]
pub enum TruthscanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Embedding dimension mismatch: expected={expected}, actual={actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index load error: {0}")]
    IndexLoad(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Perceptual hash error: {0}")]
    PerceptualHashError(String),

    #[error("Refusing to clear all data without explicit confirmation")]
    ConfirmationRequired,
}

pub type Result<T> = std::result::Result<T, TruthscanError>;
