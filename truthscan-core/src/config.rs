//! Engine configuration
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::path::PathBuf;

/// Default number of nearest neighbours requested per search.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Default minimum similarity for a search hit to be reported.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Engine configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the index files (default: data)
    pub data_dir: PathBuf,
    /// Record store document (default: <data_dir>/truthscan_data.json)
    pub record_file: PathBuf,
    /// Nearest neighbours per search (default: 5)
    pub search_k: usize,
    /// Minimum similarity for a hit (default: 0.8)
    pub similarity_threshold: f32,
    /// Hamming distance for near-duplicate fingerprint matches (default: exact only)
    pub near_match_distance: Option<u32>,
    /// Optional JSON file of known fingerprints
    pub fingerprint_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl EngineConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            record_file: data_dir.join("truthscan_data.json"),
            data_dir,
            search_k: DEFAULT_SEARCH_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            near_match_distance: None,
            fingerprint_file: None,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TRUTHSCAN_DATA_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let mut config = Self::with_data_dir(data_dir);

        if let Ok(path) = std::env::var("TRUTHSCAN_RECORD_FILE") {
            if !path.is_empty() {
                config.record_file = PathBuf::from(path);
            }
        }

        config.search_k = std::env::var("TRUTHSCAN_SEARCH_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEARCH_K);

        config.similarity_threshold = std::env::var("TRUTHSCAN_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

        config.near_match_distance = std::env::var("TRUTHSCAN_NEAR_MATCH_DISTANCE")
            .ok()
            .and_then(|v| v.parse().ok());

        config.fingerprint_file = std::env::var("TRUTHSCAN_FINGERPRINT_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        config
    }

    /// Move the configuration to a different data directory.
    ///
    /// The record file follows the directory unless it was set explicitly
    /// to a location outside the previous data directory.
    pub fn relocate(mut self, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        if self.record_file.starts_with(&self.data_dir) {
            if let Ok(relative) = self.record_file.strip_prefix(&self.data_dir) {
                self.record_file = data_dir.join(relative);
            }
        }
        self.data_dir = data_dir;
        self
    }
}
