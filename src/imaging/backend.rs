//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the pixel-level surface every operation is
//! built on: decode/encode at the codec edge, and one primitive per
//! transformation in between. Operations never touch pixels themselves.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! and `imageproc` crates and statically linked into the binary.

use super::params::{CropRect, Enhancement, FlipDirection, NamedFilter};
use crate::artifact::ImageFormatTag;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// Every method takes the image by reference and returns a fresh image, so
/// an operation that fails halfway never leaves a half-edited artifact behind.
pub trait ImageBackend: Sync {
    /// Decode encoded bytes, guessing the codec from the content.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Encode into the given format.
    fn encode(&self, image: &DynamicImage, format: ImageFormatTag)
    -> Result<Vec<u8>, BackendError>;

    /// Re-encode through the target codec and decode the result.
    ///
    /// The returned raster reflects whatever the codec keeps (a JPEG has no
    /// alpha, an ICO is at most 256 pixels on a side).
    fn convert(
        &self,
        image: &DynamicImage,
        format: ImageFormatTag,
    ) -> Result<DynamicImage, BackendError> {
        let bytes = self.encode(image, format)?;
        self.decode(&bytes)
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width` x `height`.
    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError>;

    /// Rotate about the centre, positive degrees anti-clockwise.
    ///
    /// The canvas keeps its size; uncovered corners are transparent black.
    fn rotate(&self, image: &DynamicImage, degrees: i32) -> Result<DynamicImage, BackendError>;

    fn flip(
        &self,
        image: &DynamicImage,
        direction: FlipDirection,
    ) -> Result<DynamicImage, BackendError>;

    fn filter(&self, image: &DynamicImage, filter: NamedFilter)
    -> Result<DynamicImage, BackendError>;

    /// Apply one enhancement with the given multiplier (1.0 = unchanged).
    fn enhance(
        &self,
        image: &DynamicImage,
        enhancement: Enhancement,
        factor: f32,
    ) -> Result<DynamicImage, BackendError>;

    /// Single-channel luminance.
    fn grayscale(&self, image: &DynamicImage) -> Result<DynamicImage, BackendError>;

    /// Make the background connected to the image border transparent.
    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, BackendError>;
}
