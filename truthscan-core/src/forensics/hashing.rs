//! Perceptual hashing for images.
//!
//! Computes fingerprints that stay similar for visually similar images even
//! after re-encoding, compression, or minor resizing.
//!
//! # Algorithms
//!
//! All variants produce a 64-bit (8 byte) hash rendered as 16 lower-case hex
//! characters:
//!
//! - **Average** - greyscale 8×8 thumbnail, one bit per pixel above the mean.
//! - **Perceptual** - DCT of the thumbnail, low frequencies vs. their mean.
//! - **Difference** - horizontal gradient sign between adjacent pixels.
//! - **Wavelet** - three-level Haar transform of a 64×64 greyscale image,
//!   8×8 approximation band vs. its median.
//!
//! # Usage
//!
//! ```no_run
//! use truthscan_core::forensics::{hamming_distance, HashAlgorithm, PerceptualHasher};
//!
//! # fn example(a: &image::DynamicImage, b: &image::DynamicImage) -> truthscan_core::Result<()> {
//! let hasher = PerceptualHasher::new(HashAlgorithm::Perceptual);
//! let hash1 = hasher.hash_image(a)?;
//! let hash2 = hasher.hash_image(b)?;
//! let similar = hamming_distance(&hash1.hash, &hash2.hash).is_some_and(|d| d <= 10);
//! # Ok(())
//! # }
//! ```

use image::imageops::FilterType;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TruthscanError};

/// Fixed hash size in bytes (64 bits = 8 bytes).
pub const PERCEPTUAL_HASH_SIZE: usize = 8;

/// Side of the greyscale grid the wavelet hash starts from.
const WAVELET_INPUT_SIZE: usize = 64;

/// Side of the approximation band the wavelet hash keeps.
const WAVELET_BAND_SIZE: usize = 8;

/// Perceptual hash algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Mean-threshold hash.
    Average,
    /// DCT-based hash; the most robust to recompression.
    #[default]
    Perceptual,
    /// Gradient hash.
    Difference,
    /// Haar wavelet hash.
    Wavelet,
}

impl HashAlgorithm {
    /// Every algorithm, in reporting order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Average,
        HashAlgorithm::Perceptual,
        HashAlgorithm::Difference,
        HashAlgorithm::Wavelet,
    ];
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Average => write!(f, "average"),
            Self::Perceptual => write!(f, "perceptual"),
            Self::Difference => write!(f, "difference"),
            Self::Wavelet => write!(f, "wavelet"),
        }
    }
}

/// Computed perceptual hash with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHash {
    /// The hash bytes (8 bytes for every bundled algorithm)
    pub hash: Vec<u8>,
    /// Algorithm used to compute the hash
    pub algorithm: HashAlgorithm,
    /// Hash size in bits
    pub bit_size: u32,
}

impl PerceptualHash {
    /// Create from variable-size bytes.
    pub fn from_bytes(hash: Vec<u8>, algorithm: HashAlgorithm) -> Self {
        let bit_size = (hash.len() * 8) as u32;
        Self {
            hash,
            algorithm,
            bit_size,
        }
    }

    /// Get the hash as a lower-case hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

/// The four hashes computed for every analyzed image, as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHashes {
    pub average: String,
    pub perceptual: String,
    pub difference: String,
    pub wavelet: String,
}

impl ImageHashes {
    /// Compute all four hashes for a decoded image.
    pub fn compute(image: &DynamicImage) -> Result<Self> {
        let hash = |algorithm| {
            PerceptualHasher::new(algorithm)
                .hash_image(image)
                .map(|h| h.to_hex())
        };
        Ok(Self {
            average: hash(HashAlgorithm::Average)?,
            perceptual: hash(HashAlgorithm::Perceptual)?,
            difference: hash(HashAlgorithm::Difference)?,
            wavelet: hash(HashAlgorithm::Wavelet)?,
        })
    }

    /// Look up the hash for one algorithm.
    pub fn get(&self, algorithm: HashAlgorithm) -> &str {
        match algorithm {
            HashAlgorithm::Average => &self.average,
            HashAlgorithm::Perceptual => &self.perceptual,
            HashAlgorithm::Difference => &self.difference,
            HashAlgorithm::Wavelet => &self.wavelet,
        }
    }

    /// (algorithm, hex) pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> {
        HashAlgorithm::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Perceptual hasher configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct PerceptualHasher {
    algorithm: HashAlgorithm,
}

impl PerceptualHasher {
    /// Create a new perceptual hasher with the specified algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Compute perceptual hash from a DynamicImage.
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash> {
        if image.width() == 0 || image.height() == 0 {
            return Err(TruthscanError::PerceptualHashError(
                "Cannot hash an empty image".into(),
            ));
        }

        let bytes = match self.algorithm {
            HashAlgorithm::Average => hash_with(HasherConfig::new().hash_alg(HashAlg::Mean), image),
            HashAlgorithm::Perceptual => hash_with(
                HasherConfig::new().hash_alg(HashAlg::Mean).preproc_dct(),
                image,
            ),
            HashAlgorithm::Difference => {
                hash_with(HasherConfig::new().hash_alg(HashAlg::Gradient), image)
            }
            HashAlgorithm::Wavelet => wavelet_hash(image).to_vec(),
        };

        Ok(PerceptualHash::from_bytes(bytes, self.algorithm))
    }
}

fn hash_with(config: HasherConfig, image: &DynamicImage) -> Vec<u8> {
    config
        .hash_size(8, 8)
        .to_hasher()
        .hash_image(image)
        .as_bytes()
        .to_vec()
}

/// Haar wavelet hash: 64×64 greyscale, three decomposition levels, 8×8
/// approximation band thresholded at its median.
fn wavelet_hash(image: &DynamicImage) -> [u8; PERCEPTUAL_HASH_SIZE] {
    let n = WAVELET_INPUT_SIZE;
    let grey = image
        .resize_exact(n as u32, n as u32, FilterType::Lanczos3)
        .to_luma8();
    let mut data: Vec<f32> = grey.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

    let mut size = n;
    while size > WAVELET_BAND_SIZE {
        haar_step(&mut data, n, size);
        size /= 2;
    }

    let band: Vec<f32> = (0..WAVELET_BAND_SIZE)
        .flat_map(|y| data[y * n..y * n + WAVELET_BAND_SIZE].to_vec())
        .collect();
    let median = median(&band);

    let mut hash = [0u8; PERCEPTUAL_HASH_SIZE];
    for (i, value) in band.iter().enumerate() {
        if *value > median {
            hash[i / 8] |= 0x80 >> (i % 8);
        }
    }
    hash
}

/// One 2-D Haar level over the top-left `size`×`size` block of a row-major
/// grid with row length `stride`. Averages go to the first half of each
/// axis, differences to the second.
fn haar_step(data: &mut [f32], stride: usize, size: usize) {
    let half = size / 2;
    let mut scratch = vec![0.0f32; size];

    for y in 0..size {
        let row = &mut data[y * stride..y * stride + size];
        for i in 0..half {
            let (a, b) = (row[2 * i], row[2 * i + 1]);
            scratch[i] = (a + b) / 2.0;
            scratch[half + i] = (a - b) / 2.0;
        }
        row.copy_from_slice(&scratch);
    }

    for x in 0..size {
        for i in 0..half {
            let a = data[(2 * i) * stride + x];
            let b = data[(2 * i + 1) * stride + x];
            scratch[i] = (a + b) / 2.0;
            scratch[half + i] = (a - b) / 2.0;
        }
        for (y, value) in scratch.iter().enumerate() {
            data[y * stride + x] = *value;
        }
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Compute Hamming distance between two perceptual hash byte arrays.
///
/// When sizes differ, compares the overlapping portion and adds a penalty
/// of 8 bits per byte of size difference.
///
/// # Returns
///
/// The number of differing bits (including size penalty), or `None` if either
/// array is empty.
pub fn hamming_distance(hash1: &[u8], hash2: &[u8]) -> Option<u32> {
    if hash1.is_empty() || hash2.is_empty() {
        return None;
    }

    let min_len = hash1.len().min(hash2.len());

    let distance: u32 = hash1[..min_len]
        .iter()
        .zip(hash2[..min_len].iter())
        .map(|(a, b)| (a ^ b).count_ones())
        .sum();

    let size_penalty = (hash1.len().abs_diff(hash2.len()) * 8) as u32;

    Some(distance + size_penalty)
}
