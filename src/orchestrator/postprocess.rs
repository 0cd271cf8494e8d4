//! Artifact post-processing: dimension normalization

use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;

use crate::error::{AppError, Result};

/// Read the pixel dimensions of an encoded image. Used on the source photo
/// to derive the target output dimensions at fetch time.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::Fetch(format!("source image decode failed: {}", e)))?;
    Ok((img.width(), img.height()))
}

/// Normalize a produced artifact to the target dimensions.
///
/// Backends do not reliably honor requested output sizes; anything off-target
/// is resized and re-encoded as PNG. An artifact already at the target size
/// passes through unchanged.
pub fn normalize_dimensions(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::PostProcess(format!("artifact decode failed: {}", e)))?;

    if img.width() == width && img.height() == height {
        return Ok(bytes.to_vec());
    }

    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AppError::PostProcess(format!("artifact encode failed: {}", e)))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 90, 60, 255]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn probe_reads_dimensions() {
        assert_eq!(probe_dimensions(&png(8, 6)).unwrap(), (8, 6));
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(probe_dimensions(b"not an image").is_err());
    }

    #[test]
    fn matching_dimensions_pass_through() {
        let bytes = png(8, 6);
        assert_eq!(normalize_dimensions(&bytes, 8, 6).unwrap(), bytes);
    }

    #[test]
    fn mismatched_dimensions_are_resized() {
        let normalized = normalize_dimensions(&png(4, 4), 8, 6).unwrap();
        assert_eq!(probe_dimensions(&normalized).unwrap(), (8, 6));
    }
}
