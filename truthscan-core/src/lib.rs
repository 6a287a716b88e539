//! TruthScan Core - offline verdict engine
//!
//! This crate provides the local building blocks behind the TruthScan
//! misinformation checker: a similarity index of known hoaxes, an image
//! forensics analyzer and a JSON record store for analysis history.
//!
//! # Features
//!
//! - Nearest-neighbour search over embedded hoax statements, persisted as
//!   CBOR vectors plus a JSON metadata sidecar
//! - Pluggable text embedders ([`TextEmbedder`]), with an offline hashing
//!   embedder by default and fastembed behind the `fastembed` feature
//! - Perceptual hashing, EXIF extraction and fingerprint matching for
//!   images (`perceptual-hash` feature, on by default)
//! - A single-document record store with atomic rewrites
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use truthscan_core::{EngineConfig, HashingEmbedder, RecordStore, SearchOutcome, VectorIndex};
//!
//! # fn example() -> truthscan_core::Result<()> {
//! let config = EngineConfig::from_env();
//! let index = VectorIndex::initialize(&config.data_dir, Arc::new(HashingEmbedder::new()))?;
//! let store = RecordStore::open(&config.record_file);
//!
//! if let SearchOutcome::Matches(hits) =
//!     index.search("vaccines have microchips", config.search_k, 0.4)
//! {
//!     store.save_analysis(&hits[0])?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
#[cfg(feature = "perceptual-hash")]
pub mod forensics;
pub mod fsutil;
pub mod index;
pub mod store;

// Re-export main types for convenience
pub use config::{EngineConfig, DEFAULT_SEARCH_K, DEFAULT_SIMILARITY_THRESHOLD};
pub use embedding::{HashingEmbedder, TextEmbedder, EMBEDDING_DIMENSION};
pub use error::{Result, TruthscanError};
pub use index::{
    EmbeddingRecord, HoaxMetadata, IndexStats, SearchHit, SearchOutcome, Verdict, VectorIndex,
};
pub use store::{Feedback, Record, RecordStore, StoreStats};

#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedder;

#[cfg(feature = "perceptual-hash")]
pub use forensics::{
    FingerprintEntry, FingerprintStore, ForensicsResult, ForensicsVerdict, ImageAnalysis,
    ImageForensics,
};
