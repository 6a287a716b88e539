//! Image forensics.
//!
//! Decodes an image, extracts descriptive and EXIF metadata, computes four
//! perceptual hashes, checks them against a [`FingerprintStore`] and derives
//! a coarse verdict:
//!
//! | Condition                                   | Verdict       |
//! |---------------------------------------------|---------------|
//! | a hash matches a registered fingerprint     | `MANIPULATED` |
//! | EXIF present, no fingerprint match          | `AUTHENTIC`   |
//! | neither                                     | `SUSPECT`     |
//! | payload could not be decoded                | `UNKNOWN`     |
//!
//! Missing EXIF counting as suspicious is a weak heuristic; callers should
//! treat `SUSPECT` as "no evidence either way" rather than proof.
//!
//! By default fingerprints match only on exact hash equality. Setting a
//! near-match distance additionally accepts hashes within that many bits.

mod fingerprint;
mod hashing;
mod metadata;

pub use fingerprint::{FingerprintEntry, FingerprintStore};
pub use hashing::{
    hamming_distance, HashAlgorithm, ImageHashes, PerceptualHash, PerceptualHasher,
    PERCEPTUAL_HASH_SIZE,
};
pub use metadata::{
    decode_with_metadata, read_capture_metadata, CaptureMetadata, ImageMetadata,
    EDITING_SOFTWARE,
};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;

/// Manipulation score reported when a fingerprint matches.
pub const MATCH_SCORE: f32 = 0.95;

/// Overall image verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForensicsVerdict {
    Manipulated,
    Authentic,
    Suspect,
    Unknown,
}

impl std::fmt::Display for ForensicsVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manipulated => write!(f, "MANIPULATED"),
            Self::Authentic => write!(f, "AUTHENTIC"),
            Self::Suspect => write!(f, "SUSPECT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Metadata anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFlags {
    pub missing_metadata: bool,
    pub edited_by_software: bool,
    /// Reserved; no camera heuristic is applied yet.
    pub suspicious_camera: bool,
}

/// A computed hash that matched a registered fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintMatch {
    pub algorithm: HashAlgorithm,
    /// Hash computed from the analyzed image
    pub computed_hash: String,
    pub entry: FingerprintEntry,
    /// Hamming distance; 0 for exact matches
    pub distance: u32,
}

/// Full result of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicsResult {
    pub metadata: ImageMetadata,
    pub hashes: ImageHashes,
    pub manipulation_detected: bool,
    /// 0.0, or [`MATCH_SCORE`] when a fingerprint matched
    pub manipulation_score: f32,
    pub matches: Vec<FingerprintMatch>,
    pub metadata_flags: MetadataFlags,
    pub verdict: ForensicsVerdict,
}

/// Analysis that could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForensicsFailure {
    pub error: String,
    /// Always `UNKNOWN`
    pub verdict: ForensicsVerdict,
}

/// Outcome of [`ImageForensics::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageAnalysis {
    Complete(ForensicsResult),
    Failed(ForensicsFailure),
}

impl ImageAnalysis {
    fn failed(error: impl ToString) -> Self {
        Self::Failed(ForensicsFailure {
            error: error.to_string(),
            verdict: ForensicsVerdict::Unknown,
        })
    }

    pub fn verdict(&self) -> ForensicsVerdict {
        match self {
            Self::Complete(result) => result.verdict,
            Self::Failed(failure) => failure.verdict,
        }
    }

    pub fn result(&self) -> Option<&ForensicsResult> {
        match self {
            Self::Complete(result) => Some(result),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Complete(_) => None,
            Self::Failed(failure) => Some(&failure.error),
        }
    }
}

/// Image forensics analyzer.
#[derive(Debug, Clone)]
pub struct ImageForensics {
    fingerprints: Arc<FingerprintStore>,
    near_match_distance: Option<u32>,
}

impl Default for ImageForensics {
    fn default() -> Self {
        Self::new(Arc::new(FingerprintStore::new()))
    }
}

impl ImageForensics {
    /// Create an analyzer consulting `fingerprints` by exact match.
    pub fn new(fingerprints: Arc<FingerprintStore>) -> Self {
        Self {
            fingerprints,
            near_match_distance: None,
        }
    }

    /// Also accept fingerprints within `distance` bits (None = exact only).
    pub fn with_near_match_distance(mut self, distance: Option<u32>) -> Self {
        self.near_match_distance = distance;
        self
    }

    pub fn fingerprints(&self) -> &FingerprintStore {
        &self.fingerprints
    }

    /// Analyze a base64 payload, optionally prefixed with a data-URL header
    /// such as `data:image/png;base64,`.
    pub fn analyze(&self, image_data: &str) -> ImageAnalysis {
        match decode_payload(image_data) {
            Ok(bytes) => self.analyze_bytes(&bytes),
            Err(e) => {
                warn!(error = %e, "Image payload is not valid base64");
                ImageAnalysis::failed(e)
            }
        }
    }

    /// Analyze raw image bytes.
    ///
    /// A panic inside a decoder is caught and reported as a failed analysis.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> ImageAnalysis {
        guarded(|| self.try_analyze(bytes))
    }

    fn try_analyze(&self, bytes: &[u8]) -> Result<ForensicsResult> {
        let (image, metadata) = decode_with_metadata(bytes)?;
        let hashes = ImageHashes::compute(&image)?;
        debug!(?hashes, "Computed perceptual hashes");

        let matches = self.match_fingerprints(&hashes);
        let manipulation_detected = !matches.is_empty();
        let manipulation_score = if manipulation_detected { MATCH_SCORE } else { 0.0 };

        let metadata_flags = MetadataFlags {
            missing_metadata: !metadata.has_embedded_metadata,
            edited_by_software: metadata.edited_by_software(),
            suspicious_camera: false,
        };

        let verdict = determine_verdict(manipulation_detected, metadata.has_embedded_metadata);

        Ok(ForensicsResult {
            metadata,
            hashes,
            manipulation_detected,
            manipulation_score,
            matches,
            metadata_flags,
            verdict,
        })
    }

    fn match_fingerprints(&self, hashes: &ImageHashes) -> Vec<FingerprintMatch> {
        let mut matches = Vec::new();
        for (algorithm, computed) in hashes.iter() {
            if let Some(entry) = self.fingerprints.lookup(computed) {
                matches.push(FingerprintMatch {
                    algorithm,
                    computed_hash: computed.to_string(),
                    entry: entry.clone(),
                    distance: 0,
                });
                continue;
            }

            if let Some(max_distance) = self.near_match_distance {
                if let Some((entry, distance)) = self
                    .fingerprints
                    .near_matches(computed, max_distance)
                    .into_iter()
                    .next()
                {
                    matches.push(FingerprintMatch {
                        algorithm,
                        computed_hash: computed.to_string(),
                        entry: entry.clone(),
                        distance,
                    });
                }
            }
        }
        matches
    }
}

/// Run one analysis, turning errors and panics into [`ImageAnalysis::Failed`].
fn guarded(analysis: impl FnOnce() -> Result<ForensicsResult>) -> ImageAnalysis {
    match panic::catch_unwind(AssertUnwindSafe(analysis)) {
        Ok(Ok(result)) => {
            info!(
                verdict = %result.verdict,
                format = %result.metadata.format,
                matches = result.matches.len(),
                "Image analyzed"
            );
            ImageAnalysis::Complete(result)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Image forensics failed");
            ImageAnalysis::failed(e)
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(reason = %reason, "Image decoder panicked");
            ImageAnalysis::failed(format!("Image decoder panicked: {reason}"))
        }
    }
}

/// Verdict by priority: fingerprint match, then EXIF presence.
pub fn determine_verdict(manipulation_detected: bool, has_embedded_metadata: bool) -> ForensicsVerdict {
    if manipulation_detected {
        ForensicsVerdict::Manipulated
    } else if has_embedded_metadata {
        ForensicsVerdict::Authentic
    } else {
        ForensicsVerdict::Suspect
    }
}

/// Strip an optional data-URL header (through the first comma) and decode
/// the remaining base64. Embedded whitespace is ignored.
pub fn decode_payload(image_data: &str) -> Result<Vec<u8>> {
    let payload = match image_data.find(',') {
        Some(comma) => &image_data[comma + 1..],
        None => image_data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes())?)
}
