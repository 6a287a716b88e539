//! Persisted vector similarity index of known hoaxes.
//!
//! The index keeps two parallel structures: a [`FlatIndex`] of embedding
//! vectors and a `Vec<EmbeddingRecord>` of metadata. Position `i` in both
//! refers to the same statement. On disk they live side by side:
//!
//! - `hoax_index.bin` - CBOR-encoded vectors
//! - `hoax_metadata.json` - JSON array of records, in insertion order
//!
//! # Similarity score
//!
//! Search ranks by squared Euclidean distance `d` and reports
//! `similarity = 1 - d / 2.0`. For unit-length embeddings this stays within
//! `[-1, 1]`, but it is a heuristic, not a cosine similarity.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use truthscan_core::index::VectorIndex;
//! use truthscan_core::embedding::HashingEmbedder;
//!
//! # fn example() -> truthscan_core::Result<()> {
//! let mut index = VectorIndex::initialize("data", Arc::new(HashingEmbedder::new()))?;
//! for hit in index.search("vaccines have microchips", 5, 0.3).into_hits() {
//!     println!("{:.2} {}", hit.similarity, hit.matched_metadata.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The index has no internal locking. Callers sharing one across threads
//! must serialise `insert`, `search` and `persist` themselves.

mod flat;
mod record;
mod seed;

pub use flat::{squared_l2, FlatIndex};
pub use record::{EmbeddingRecord, HoaxMetadata, Verdict};
pub use seed::{seed_hoaxes, SEED_COUNT};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embedding::TextEmbedder;
use crate::error::{Result, TruthscanError};
use crate::fsutil;

/// File name of the binary vector index.
pub const INDEX_FILE_NAME: &str = "hoax_index.bin";

/// File name of the JSON metadata sidecar.
pub const METADATA_FILE_NAME: &str = "hoax_metadata.json";

/// Distance that maps to a similarity of zero.
const MAX_DISTANCE: f32 = 2.0;

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// `1 - squared_distance / 2.0`
    pub similarity: f32,
    pub matched_metadata: EmbeddingRecord,
    /// 1-based position among the returned hits
    pub rank: usize,
}

/// Result of a similarity search.
///
/// Distinguishes "nothing similar enough" from "the search could not run".
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one hit, best first.
    Matches(Vec<SearchHit>),
    /// The search ran but nothing met the threshold.
    NoMatch,
    /// Embedding or index failure.
    Failed(String),
}

impl SearchOutcome {
    /// Hits as a plain list; empty for both `NoMatch` and `Failed`.
    pub fn into_hits(self) -> Vec<SearchHit> {
        match self {
            Self::Matches(hits) => hits,
            Self::NoMatch | Self::Failed(_) => Vec::new(),
        }
    }

    /// Borrow the hits; empty for both `NoMatch` and `Failed`.
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            Self::Matches(hits) => hits,
            Self::NoMatch | Self::Failed(_) => &[],
        }
    }

    /// The best-ranked hit, if any.
    pub fn best(&self) -> Option<&SearchHit> {
        self.hits().first()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Metadata records
    pub total_entries: usize,
    /// Stored vectors
    pub index_size: usize,
    pub embedding_dimension: usize,
}

/// Vector similarity index over known hoax statements.
pub struct VectorIndex {
    storage_dir: PathBuf,
    embedder: Arc<dyn TextEmbedder>,
    vectors: FlatIndex,
    metadata: Vec<EmbeddingRecord>,
}

impl VectorIndex {
    /// Open the index stored in `storage_dir`, or build a seeded one.
    ///
    /// Both files must exist, parse, match the embedder's dimension and
    /// agree on the number of entries. Otherwise a fresh index is created
    /// from the starter corpus and written back. A discarded index loses
    /// every entry that was not part of the seed corpus; this is logged at
    /// `warn` level.
    pub fn initialize(
        storage_dir: impl Into<PathBuf>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;

        let index_path = storage_dir.join(INDEX_FILE_NAME);
        let metadata_path = storage_dir.join(METADATA_FILE_NAME);

        if index_path.exists() && metadata_path.exists() {
            info!(path = %storage_dir.display(), "Loading existing index");
            match load(&index_path, &metadata_path, embedder.dimension()) {
                Ok((vectors, metadata)) => {
                    info!(entries = metadata.len(), "Loaded index");
                    return Ok(Self {
                        storage_dir,
                        embedder,
                        vectors,
                        metadata,
                    });
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        path = %storage_dir.display(),
                        "Discarding unreadable index; entries added after seeding are lost"
                    );
                }
            }
        } else if index_path.exists() || metadata_path.exists() {
            warn!(
                path = %storage_dir.display(),
                "Index files incomplete; rebuilding from seed corpus"
            );
        }

        Self::create_seeded(storage_dir, embedder)
    }

    /// Build a fresh index containing the seed corpus and persist it.
    fn create_seeded(storage_dir: PathBuf, embedder: Arc<dyn TextEmbedder>) -> Result<Self> {
        info!(model = embedder.model_name(), "Creating new index");
        let mut index = Self {
            vectors: FlatIndex::new(embedder.dimension()),
            metadata: Vec::new(),
            storage_dir,
            embedder,
        };

        for (text, metadata) in seed_hoaxes() {
            index.insert(text, metadata)?;
        }
        info!(count = SEED_COUNT, "Seeded sample hoaxes");

        if let Err(e) = index.persist() {
            warn!(error = %e, "Failed to persist seeded index");
        }
        Ok(index)
    }

    /// Embed `text` and append it with its metadata.
    ///
    /// Returns the new entry's position. Not persisted until [`persist`](Self::persist).
    pub fn insert(&mut self, text: &str, metadata: HoaxMetadata) -> Result<usize> {
        let vector = self.embedder.embed(text)?;
        self.vectors.add(&vector)?;
        self.metadata.push(EmbeddingRecord {
            text: text.to_string(),
            metadata,
        });
        debug!(
            text = %text.chars().take(50).collect::<String>(),
            "Added entry to index"
        );
        Ok(self.metadata.len() - 1)
    }

    /// Find up to `k` entries whose similarity is at least `threshold`.
    pub fn search(&self, text: &str, k: usize, threshold: f32) -> SearchOutcome {
        match self.try_search(text, k, threshold) {
            Ok(hits) if hits.is_empty() => SearchOutcome::NoMatch,
            Ok(hits) => SearchOutcome::Matches(hits),
            Err(e) => {
                warn!(error = %e, "Index search failed");
                SearchOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_search(&self, text: &str, k: usize, threshold: f32) -> Result<Vec<SearchHit>> {
        let query = self.embedder.embed(text)?;
        let neighbours = self.vectors.search(&query, k)?;

        let hits = neighbours
            .into_iter()
            .filter_map(|(distance, position)| {
                let similarity = 1.0 - distance / MAX_DISTANCE;
                // NaN similarities fail this comparison too
                if !(similarity >= threshold) {
                    return None;
                }
                let record = self.metadata.get(position)?;
                Some((similarity, record.clone()))
            })
            .enumerate()
            .map(|(i, (similarity, matched_metadata))| SearchHit {
                similarity,
                matched_metadata,
                rank: i + 1,
            })
            .collect();

        Ok(hits)
    }

    /// Write the vectors and the metadata sidecar to the storage directory.
    pub fn persist(&self) -> Result<()> {
        fsutil::write_atomic(&self.index_path(), &self.vectors.to_cbor()?)?;
        fsutil::write_atomic(&self.metadata_path(), &fsutil::to_pretty_json(&self.metadata)?)?;
        info!(entries = self.metadata.len(), "Index saved");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_entries: self.metadata.len(),
            index_size: self.vectors.ntotal(),
            embedding_dimension: self.embedder.dimension(),
        }
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Stored records in insertion order.
    pub fn entries(&self) -> &[EmbeddingRecord] {
        &self.metadata
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join(INDEX_FILE_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.storage_dir.join(METADATA_FILE_NAME)
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("storage_dir", &self.storage_dir)
            .field("model", &self.embedder.model_name())
            .field("entries", &self.metadata.len())
            .finish()
    }
}

fn load(
    index_path: &Path,
    metadata_path: &Path,
    dimension: usize,
) -> Result<(FlatIndex, Vec<EmbeddingRecord>)> {
    let vectors = FlatIndex::from_cbor(&std::fs::read(index_path)?)?;
    let metadata: Vec<EmbeddingRecord> = serde_json::from_slice(&std::fs::read(metadata_path)?)?;

    if vectors.dimension() != dimension {
        return Err(TruthscanError::DimensionMismatch {
            expected: dimension,
            actual: vectors.dimension(),
        });
    }
    if vectors.ntotal() != metadata.len() {
        return Err(TruthscanError::IndexLoad(format!(
            "{} vectors but {} metadata records",
            vectors.ntotal(),
            metadata.len()
        )));
    }

    Ok((vectors, metadata))
}
