//! Descriptive and embedded (EXIF) image metadata.

use std::io::Cursor;

use exif::{In, Tag, Value};
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TruthscanError};

/// Image editors whose name in the EXIF software tag marks an edited file.
pub const EDITING_SOFTWARE: [&str; 4] = ["photoshop", "gimp", "paint.net", "pixlr"];

/// Metadata extracted from an image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Container format, e.g. "JPEG"
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Pixel layout, e.g. "RGB", "RGBA", "L"
    pub color_mode: String,
    /// EXIF block present
    pub has_embedded_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    /// Original capture time as written by the camera
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ImageMetadata {
    /// True when the software tag names a known image editor.
    pub fn edited_by_software(&self) -> bool {
        self.software.as_deref().is_some_and(|software| {
            let software = software.to_lowercase();
            EDITING_SOFTWARE.iter().any(|tool| software.contains(tool))
        })
    }
}

/// Capture metadata read from an EXIF block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub camera: Option<String>,
    pub software: Option<String>,
    pub timestamp: Option<String>,
}

/// Decode `bytes` and collect its metadata.
///
/// A missing or unreadable EXIF block is not an error; it only leaves
/// `has_embedded_metadata` false.
pub fn decode_with_metadata(bytes: &[u8]) -> Result<(DynamicImage, ImageMetadata)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| TruthscanError::ImageDecode(format!("Failed to read image: {}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| TruthscanError::ImageDecode("Unrecognized image format".into()))?;

    let image = reader
        .decode()
        .map_err(|e| TruthscanError::ImageDecode(format!("Failed to decode image: {}", e)))?;

    let capture = read_capture_metadata(bytes);

    let metadata = ImageMetadata {
        format: format_name(format),
        width: image.width(),
        height: image.height(),
        color_mode: color_mode(image.color()).to_string(),
        has_embedded_metadata: capture.is_some(),
        camera: capture.as_ref().and_then(|c| c.camera.clone()),
        software: capture.as_ref().and_then(|c| c.software.clone()),
        timestamp: capture.and_then(|c| c.timestamp),
    };

    Ok((image, metadata))
}

/// Read camera model, software and capture time from an EXIF block.
///
/// Returns `None` when the container carries no EXIF data at all.
pub fn read_capture_metadata(bytes: &[u8]) -> Option<CaptureMetadata> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "No readable EXIF block");
            return None;
        }
    };

    if exif.fields().next().is_none() {
        return None;
    }

    Some(CaptureMetadata {
        camera: ascii_field(&exif, Tag::Model),
        software: ascii_field(&exif, Tag::Software),
        timestamp: ascii_field(&exif, Tag::DateTimeOriginal),
    })
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|part| {
                String::from_utf8_lossy(part)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_with_software(software: Option<&str>) -> ImageMetadata {
        ImageMetadata {
            software: software.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_edited_by_software_case_insensitive() {
        assert!(metadata_with_software(Some("Adobe Photoshop CC 2019")).edited_by_software());
        assert!(metadata_with_software(Some("GIMP 2.10.30")).edited_by_software());
        assert!(metadata_with_software(Some("Paint.NET v5")).edited_by_software());
        assert!(metadata_with_software(Some("pixlr editor")).edited_by_software());
    }

    #[test]
    fn test_not_edited_by_camera_firmware() {
        assert!(!metadata_with_software(Some("HDR+ 1.0.345")).edited_by_software());
        assert!(!metadata_with_software(None).edited_by_software());
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name(ImageFormat::Png), "PNG");
        assert_eq!(format_name(ImageFormat::Jpeg), "JPEG");
    }

    #[test]
    fn test_color_mode_names() {
        assert_eq!(color_mode(ColorType::Rgb8), "RGB");
        assert_eq!(color_mode(ColorType::La8), "LA");
        assert_eq!(color_mode(ColorType::L8), "L");
    }

    #[test]
    fn test_no_exif_in_garbage() {
        assert!(read_capture_metadata(b"definitely not an image").is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_with_metadata(b"definitely not an image").unwrap_err(),
            TruthscanError::ImageDecode(_)
        ));
    }
}
