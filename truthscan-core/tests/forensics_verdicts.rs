//! End-to-end verdict tests for image forensics.
//!
//! Test images are generated in memory: a PNG without any embedded
//! metadata and a JPEG carrying a minimal EXIF block.

#![cfg(feature = "perceptual-hash")]

use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use truthscan_core::forensics::{
    FingerprintEntry, FingerprintStore, ForensicsVerdict, HashAlgorithm, ImageForensics,
    ImageHashes, MATCH_SCORE,
};

/// Gradient with a checkerboard overlay so every hash sees some structure.
fn create_test_image(width: u32, height: u32) -> RgbImage {
    let mut img = ImageBuffer::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let r = ((x as f32 / width as f32) * 255.0) as u8;
        let g = ((y as f32 / height as f32) * 255.0) as u8;
        let b = (((x + y) as f32 / (width + height) as f32) * 200.0) as u8;
        let pattern = if (x / 16 + y / 16) % 2 == 0 { 40 } else { 0 };
        *pixel = Rgb([r.saturating_add(pattern), g, b]);
    }
    img
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

fn png_bytes() -> Vec<u8> {
    encode(&create_test_image(128, 96), ImageFormat::Png)
}

const TAG_MODEL: u16 = 0x0110;
const TAG_SOFTWARE: u16 = 0x0131;

/// APP1 segment holding a little-endian TIFF block whose IFD0 carries the
/// given ASCII entries. Tags must be ascending and values longer than three
/// bytes, so every value lives in the data area after the IFD.
fn exif_app1_segment(entries: &[(u16, &str)]) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());

    let mut data = Vec::new();
    let data_start = 8 + 2 + 12 * entries.len() + 4;
    // IFD0
    tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, value) in entries {
        assert!(value.len() > 3);
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
        tiff.extend_from_slice(&(value.len() as u32 + 1).to_le_bytes());
        tiff.extend_from_slice(&((data_start + data.len()) as u32).to_le_bytes());
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        if data.len() % 2 == 1 {
            data.push(0);
        }
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(tiff.len(), data_start);
    tiff.extend_from_slice(&data);

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

fn jpeg_with_entries(entries: &[(u16, &str)]) -> Vec<u8> {
    let jpeg = encode(&create_test_image(128, 96), ImageFormat::Jpeg);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&exif_app1_segment(entries));
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// JPEG whose EXIF block names only the camera model "TestCam".
fn jpeg_with_exif() -> Vec<u8> {
    jpeg_with_entries(&[(TAG_MODEL, "TestCam")])
}

fn computed_hashes(bytes: &[u8]) -> ImageHashes {
    ImageHashes::compute(&image::load_from_memory(bytes).unwrap()).unwrap()
}

fn flip_lowest_bit(hex_hash: &str) -> String {
    let mut bytes = hex::decode(hex_hash).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    hex::encode(bytes)
}

#[test]
fn test_png_without_exif_is_suspect() {
    let analysis = ImageForensics::default().analyze_bytes(&png_bytes());
    let result = analysis.result().expect("analysis should complete");

    assert_eq!(result.verdict, ForensicsVerdict::Suspect);
    assert_eq!(result.metadata.format, "PNG");
    assert_eq!((result.metadata.width, result.metadata.height), (128, 96));
    assert_eq!(result.metadata.color_mode, "RGB");
    assert!(!result.metadata.has_embedded_metadata);
    assert!(result.metadata_flags.missing_metadata);
    assert!(!result.manipulation_detected);
    assert_eq!(result.manipulation_score, 0.0);
    assert!(result.matches.is_empty());
}

#[test]
fn test_jpeg_with_exif_is_authentic() {
    let analysis = ImageForensics::default().analyze_bytes(&jpeg_with_exif());
    let result = analysis.result().expect("analysis should complete");

    assert_eq!(result.verdict, ForensicsVerdict::Authentic);
    assert_eq!(result.metadata.format, "JPEG");
    assert!(result.metadata.has_embedded_metadata);
    assert_eq!(result.metadata.camera.as_deref(), Some("TestCam"));
    assert!(result.metadata.software.is_none());
    assert!(!result.metadata_flags.missing_metadata);
    assert!(!result.metadata_flags.edited_by_software);
    assert!(!result.metadata_flags.suspicious_camera);
}

#[test]
fn test_editing_software_is_flagged_but_stays_authentic() {
    let bytes = jpeg_with_entries(&[
        (TAG_MODEL, "TestCam"),
        (TAG_SOFTWARE, "Adobe Photoshop 25.0"),
    ]);
    let analysis = ImageForensics::default().analyze_bytes(&bytes);
    let result = analysis.result().expect("analysis should complete");

    assert_eq!(result.verdict, ForensicsVerdict::Authentic);
    assert_eq!(result.metadata.camera.as_deref(), Some("TestCam"));
    assert_eq!(result.metadata.software.as_deref(), Some("Adobe Photoshop 25.0"));
    assert!(result.metadata_flags.edited_by_software);
    assert!(!result.manipulation_detected);
}

#[test]
fn test_registered_fingerprint_is_manipulated() {
    let bytes = jpeg_with_exif();
    let hashes = computed_hashes(&bytes);

    let store = FingerprintStore::from_entries([FingerprintEntry::new(
        hashes.perceptual.clone(),
        "Doctored rally photo",
        "factcheck desk",
    )]);
    let analysis = ImageForensics::new(Arc::new(store)).analyze_bytes(&bytes);
    let result = analysis.result().unwrap();

    // a fingerprint match outranks the presence of EXIF
    assert_eq!(result.verdict, ForensicsVerdict::Manipulated);
    assert!(result.manipulation_detected);
    assert_eq!(result.manipulation_score, MATCH_SCORE);

    let hit = result
        .matches
        .iter()
        .find(|m| m.algorithm == HashAlgorithm::Perceptual)
        .unwrap();
    assert_eq!(hit.distance, 0);
    assert_eq!(hit.entry.description, "Doctored rally photo");
    assert_eq!(hit.computed_hash, hashes.perceptual);
}

#[test]
fn test_hashes_are_reported_as_hex() {
    let analysis = ImageForensics::default().analyze_bytes(&png_bytes());
    let result = analysis.result().unwrap();
    for (_, hash) in result.hashes.iter() {
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

#[test]
fn test_near_match_is_opt_in() {
    let bytes = png_bytes();
    let hashes = computed_hashes(&bytes);
    let near = flip_lowest_bit(&hashes.perceptual);

    let store = Arc::new(FingerprintStore::from_entries([FingerprintEntry::new(
        near.clone(),
        "Re-encoded copy of a known fake",
        "archive",
    )]));

    let exact = ImageForensics::new(Arc::clone(&store)).analyze_bytes(&bytes);
    assert!(exact
        .result()
        .unwrap()
        .matches
        .iter()
        .all(|m| m.algorithm != HashAlgorithm::Perceptual));

    let tolerant = ImageForensics::new(store)
        .with_near_match_distance(Some(1))
        .analyze_bytes(&bytes);
    let result = tolerant.result().unwrap();
    assert_eq!(result.verdict, ForensicsVerdict::Manipulated);

    let hit = result
        .matches
        .iter()
        .find(|m| m.algorithm == HashAlgorithm::Perceptual)
        .unwrap();
    assert_eq!(hit.distance, 1);
    assert_eq!(hit.entry.hash_value, near);
}

#[test]
fn test_data_url_payload() {
    let payload = format!("data:image/png;base64,{}", BASE64.encode(png_bytes()));
    let analysis = ImageForensics::default().analyze(&payload);
    assert_eq!(analysis.verdict(), ForensicsVerdict::Suspect);
}

#[test]
fn test_plain_base64_payload() {
    let payload = BASE64.encode(jpeg_with_exif());
    let analysis = ImageForensics::default().analyze(&payload);
    assert_eq!(analysis.verdict(), ForensicsVerdict::Authentic);
}

#[test]
fn test_garbage_is_unknown() {
    let payload = BASE64.encode(b"this is not an image at all");
    let analysis = ImageForensics::default().analyze(&payload);

    assert_eq!(analysis.verdict(), ForensicsVerdict::Unknown);
    assert!(analysis.result().is_none());

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["verdict"], "UNKNOWN");
    assert!(json["error"].as_str().unwrap().len() > 0);
}

#[test]
fn test_complete_result_serializes_camel_case() {
    let analysis = ImageForensics::default().analyze_bytes(&jpeg_with_exif());
    let json = serde_json::to_value(&analysis).unwrap();

    assert_eq!(json["verdict"], "AUTHENTIC");
    assert_eq!(json["manipulationDetected"], false);
    assert_eq!(json["metadata"]["hasEmbeddedMetadata"], true);
    assert_eq!(json["metadata"]["camera"], "TestCam");
    assert_eq!(json["metadataFlags"]["missingMetadata"], false);
    assert!(json["hashes"]["wavelet"].is_string());
}
