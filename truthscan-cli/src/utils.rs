//! Common utility functions shared across CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use tracing::{debug, info};
use truthscan_core::{
    EngineConfig, FingerprintStore, ImageForensics, RecordStore, TextEmbedder, VectorIndex,
};

/// Embedder used for both building and querying the index.
pub fn embedder() -> Result<Arc<dyn TextEmbedder>> {
    #[cfg(feature = "fastembed")]
    {
        let embedder = truthscan_core::FastEmbedder::new()
            .context("Failed to load sentence embedding model")?;
        Ok(Arc::new(embedder))
    }
    #[cfg(not(feature = "fastembed"))]
    {
        Ok(Arc::new(truthscan_core::HashingEmbedder::new()))
    }
}

/// Open (or seed) the hoax index in the configured data directory.
pub fn open_index(config: &EngineConfig) -> Result<VectorIndex> {
    let index = VectorIndex::initialize(&config.data_dir, embedder()?).with_context(|| {
        format!("Failed to open hoax index in {}", config.data_dir.display())
    })?;
    debug!(entries = index.len(), "Index ready");
    Ok(index)
}

pub fn open_store(config: &EngineConfig) -> RecordStore {
    RecordStore::open(&config.record_file)
}

/// Build the forensics analyzer, loading known fingerprints when configured.
pub fn open_forensics(config: &EngineConfig) -> Result<ImageForensics> {
    let fingerprints = match &config.fingerprint_file {
        Some(path) => FingerprintStore::load_json(path).with_context(|| {
            format!("Failed to load fingerprint file: {}", path.display())
        })?,
        None => FingerprintStore::new(),
    };
    info!(fingerprints = fingerprints.len(), "Forensics ready");

    Ok(ImageForensics::new(Arc::new(fingerprints))
        .with_near_match_distance(config.near_match_distance))
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// Colour a verdict label by severity.
pub fn paint_verdict(verdict: &str) -> ColoredString {
    match verdict {
        "FAKE" | "MANIPULATED" => verdict.red().bold(),
        "MISLEADING" | "SUSPECT" => verdict.yellow().bold(),
        "REAL" | "AUTHENTIC" => verdict.green().bold(),
        _ => verdict.dimmed(),
    }
}

/// Shorten `text` to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
