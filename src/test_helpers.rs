//! Shared test utilities for the imagehacker test suite.
//!
//! Builds synthetic rasters, encoded images and request envelopes so tests
//! never depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let request = envelope(
//!     &png_bytes(&gradient_rgba(40, 20)),
//!     json!("png"),
//!     json!({"resize": {"resizeByPercentage": {"percentage": 50}}}),
//! );
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use std::io::Cursor;

// =========================================================================
// Rasters
// =========================================================================

/// An RGBA image whose pixels differ by position.
pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 5 % 256) as u8, (y * 9 % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}

/// A flat background with a centred square of another colour.
pub fn square_on_background(size: u32, background: [u8; 3], square: [u8; 3]) -> DynamicImage {
    let (lo, hi) = (size / 4, size - size / 4);
    DynamicImage::ImageRgba8(RgbaImage::from_fn(size, size, |x, y| {
        let [r, g, b] = if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            square
        } else {
            background
        };
        Rgba([r, g, b, 255])
    }))
}

// =========================================================================
// Encoding
// =========================================================================

pub fn encode_as(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let prepared = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };
    prepared.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    encode_as(image, ImageFormat::Png)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// =========================================================================
// Envelopes
// =========================================================================

/// A full request envelope around encoded image bytes.
pub fn envelope(image: &[u8], format: Value, action: Value) -> Value {
    json!({
        "imageBase64URL": encode_base64(image),
        "imageFormat": format,
        "action": action,
    })
}
