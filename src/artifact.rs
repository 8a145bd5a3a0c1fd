//! In-memory images and the four formats the editor accepts.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fmt;
use std::path::Path;

/// Declared format of an artifact.
///
/// The user-facing name of [`Jpg`](ImageFormatTag::Jpg) is `jpg`; only the
/// codec layer calls it JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatTag {
    Bmp,
    Ico,
    Jpg,
    Png,
}

impl ImageFormatTag {
    pub const ALL: &'static [ImageFormatTag] = &[
        ImageFormatTag::Bmp,
        ImageFormatTag::Ico,
        ImageFormatTag::Jpg,
        ImageFormatTag::Png,
    ];

    /// Parse a format name or extension, case-insensitively.
    ///
    /// A leading dot is ignored and `jpeg` is accepted for JPG.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('.');
        match name.to_ascii_lowercase().as_str() {
            "bmp" => Some(Self::Bmp),
            "ico" => Some(Self::Ico),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Upper-case tag: `BMP`, `ICO`, `JPG`, `PNG`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bmp => "BMP",
            Self::Ico => "ICO",
            Self::Jpg => "JPG",
            Self::Png => "PNG",
        }
    }

    /// Lower-case file extension, also the `imageFormat` reported to callers.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Ico => "ico",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    /// Name the codec knows the format by.
    pub fn codec_name(self) -> &'static str {
        match self {
            Self::Jpg => "JPEG",
            other => other.name(),
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Bmp => ImageFormat::Bmp,
            Self::Ico => ImageFormat::Ico,
            Self::Jpg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
    }
}

impl fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A decoded raster plus its declared format.
///
/// Owned by one request from decode to re-encode; operations consume a
/// borrowed artifact and hand back a new one.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    image: DynamicImage,
    format: ImageFormatTag,
}

impl ImageArtifact {
    pub fn new(image: DynamicImage, format: ImageFormatTag) -> Self {
        Self { image, format }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn format(&self) -> ImageFormatTag {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// A new artifact carrying this artifact's format.
    pub fn derive(&self, image: DynamicImage) -> Self {
        Self::new(image, self.format)
    }
}
