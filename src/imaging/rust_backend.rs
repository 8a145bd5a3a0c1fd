//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode / encode (BMP, ICO, JPEG, PNG) | `image` crate codecs |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Rotate | `imageproc::geometric_transformations::rotate_about_center`, nearest |
//! | Flip | `DynamicImage::fliph` / `flipv` |
//! | Named filters | [`kernels::convolve`](super::kernels::convolve) |
//! | Enhance | blend against a degenerate image (black, mean grey, greyscale, smoothed) |
//! | Greyscale | ITU-R 601-2 luma |
//! | Background removal | border flood fill against the corner colours |

use super::backend::{BackendError, ImageBackend};
use super::kernels::{self, SMOOTH};
use super::params::{CropRect, Enhancement, FlipDirection, NamedFilter};
use crate::artifact::ImageFormatTag;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::collections::VecDeque;
use std::io::Cursor;

/// Largest side an ICO entry can have.
pub const ICO_MAX_SIDE: u32 = 256;

/// Resize targets beyond this many pixels are refused.
const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Default per-channel distance for a pixel to count as background.
pub const DEFAULT_BACKGROUND_TOLERANCE: u8 = 32;

/// Pure Rust backend using the `image` and `imageproc` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    background_tolerance: u8,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            background_tolerance: DEFAULT_BACKGROUND_TOLERANCE,
        }
    }

    /// Backend whose background removal accepts `tolerance` per channel.
    pub fn with_background_tolerance(tolerance: u8) -> Self {
        Self {
            background_tolerance: tolerance,
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Luma as `L = R * 299/1000 + G * 587/1000 + B * 114/1000`.
fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// Bring a working RGBA buffer back to the caller's colour type.
fn restore_color(color: ColorType, rgba: RgbaImage) -> DynamicImage {
    let out = DynamicImage::ImageRgba8(rgba);
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(out.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(out.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(out.to_rgb8()),
        _ => out,
    }
}

/// Convert to a pixel layout the target codec can write.
fn encodable(image: &DynamicImage, format: ImageFormatTag) -> Result<DynamicImage, BackendError> {
    let (width, height) = image.dimensions();
    match format {
        ImageFormatTag::Jpg => Ok(match image.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                DynamicImage::ImageLuma8(image.to_luma8())
            }
            _ => DynamicImage::ImageRgb8(image.to_rgb8()),
        }),
        ImageFormatTag::Ico => {
            // shrink to fit the largest ICO entry, keeping the aspect ratio
            let fitted = if width > ICO_MAX_SIDE || height > ICO_MAX_SIDE {
                image.thumbnail(ICO_MAX_SIDE, ICO_MAX_SIDE)
            } else {
                image.clone()
            };
            Ok(DynamicImage::ImageRgba8(fitted.to_rgba8()))
        }
        ImageFormatTag::Bmp | ImageFormatTag::Png => Ok(match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => image.clone(),
            _ => DynamicImage::ImageRgba8(image.to_rgba8()),
        }),
    }
}

/// `degenerate + (image - degenerate) * factor` per colour channel.
fn blend(degenerate: &RgbaImage, image: &RgbaImage, factor: f32) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let d = degenerate.get_pixel(x, y).0;
        let p = image.get_pixel(x, y).0;
        let mix = |c: usize| {
            (d[c] as f32 + (p[c] as f32 - d[c] as f32) * factor)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba([mix(0), mix(1), mix(2), p[3]])
    })
}

fn degenerate_for(enhancement: Enhancement, rgba: &RgbaImage) -> RgbaImage {
    let (width, height) = rgba.dimensions();
    match enhancement {
        Enhancement::Brightness => RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        Enhancement::Contrast => {
            let count = (width as u64 * height as u64).max(1);
            let total: u64 = rgba.pixels().map(|p| luma(p) as u64).sum();
            let mean = (total as f64 / count as f64 + 0.5) as u8;
            RgbaImage::from_pixel(width, height, Rgba([mean, mean, mean, 255]))
        }
        Enhancement::Color => RgbaImage::from_fn(width, height, |x, y| {
            let l = luma(rgba.get_pixel(x, y));
            Rgba([l, l, l, 255])
        }),
        Enhancement::Sharpness => kernels::convolve(rgba, &SMOOTH),
    }
}

/// Mark pixels reachable from the border through background-coloured pixels.
fn background_mask(rgba: &RgbaImage, tolerance: u8) -> Vec<bool> {
    let (width, height) = rgba.dimensions();
    let corners = [
        *rgba.get_pixel(0, 0),
        *rgba.get_pixel(width - 1, 0),
        *rgba.get_pixel(0, height - 1),
        *rgba.get_pixel(width - 1, height - 1),
    ];
    let is_background = |p: &Rgba<u8>| {
        corners.iter().any(|c| {
            (0..3).all(|i| (c.0[i] as i16 - p.0[i] as i16).unsigned_abs() <= tolerance as u16)
        })
    };

    let index = |x: u32, y: u32| (y as usize) * (width as usize) + x as usize;
    let mut mask = vec![false; width as usize * height as usize];
    let mut queue = VecDeque::new();

    let border = (0..width)
        .flat_map(|x| [(x, 0), (x, height - 1)])
        .chain((0..height).flat_map(|y| [(0, y), (width - 1, y)]));
    for (x, y) in border {
        if !mask[index(x, y)] && is_background(rgba.get_pixel(x, y)) {
            mask[index(x, y)] = true;
            queue.push_back((x, y));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let neighbours = [
            (x.checked_sub(1), Some(y)),
            (x.checked_add(1).filter(|&nx| nx < width), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), y.checked_add(1).filter(|&ny| ny < height)),
        ];
        for (nx, ny) in neighbours {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let i = index(nx, ny);
            if !mask[i] && is_background(rgba.get_pixel(nx, ny)) {
                mask[i] = true;
                queue.push_back((nx, ny));
            }
        }
    }
    mask
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {e}")))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormatTag,
    ) -> Result<Vec<u8>, BackendError> {
        let prepared = encodable(image, format)?;
        let mut buffer = Cursor::new(Vec::new());
        prepared
            .write_to(&mut buffer, format.image_format())
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to encode {}: {e}",
                    format.codec_name()
                ))
            })?;
        Ok(buffer.into_inner())
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, BackendError> {
        let (width, height) = image.dimensions();
        if rect.width() == 0 || rect.height() == 0 || rect.right > width || rect.bottom > height {
            return Err(BackendError::ProcessingFailed(format!(
                "crop {rect:?} does not fit a {width}x{height} image"
            )));
        }
        Ok(image.crop_imm(rect.left, rect.top, rect.width(), rect.height()))
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot resize to {width}x{height}"
            )));
        }
        if width as u64 * height as u64 > MAX_OUTPUT_PIXELS {
            return Err(BackendError::ProcessingFailed(format!(
                "{width}x{height} exceeds the {MAX_OUTPUT_PIXELS} pixel limit"
            )));
        }
        Ok(image.resize_exact(width, height, FilterType::CatmullRom))
    }

    fn rotate(&self, image: &DynamicImage, degrees: i32) -> Result<DynamicImage, BackendError> {
        let square = image.width() == image.height();
        match degrees.rem_euclid(360) {
            0 => return Ok(image.clone()),
            180 => return Ok(image.rotate180()),
            // image's rotate90 turns clockwise
            90 if square => return Ok(image.rotate270()),
            270 if square => return Ok(image.rotate90()),
            _ => {}
        }
        // imageproc turns clockwise for positive theta
        let theta = -(degrees as f32).to_radians();
        let rotated = rotate_about_center(
            &image.to_rgba8(),
            theta,
            Interpolation::Nearest,
            Rgba([0, 0, 0, 0]),
        );
        Ok(restore_color(image.color(), rotated))
    }

    fn flip(
        &self,
        image: &DynamicImage,
        direction: FlipDirection,
    ) -> Result<DynamicImage, BackendError> {
        Ok(match direction {
            FlipDirection::Horizontal => image.fliph(),
            FlipDirection::Vertical => image.flipv(),
        })
    }

    fn filter(
        &self,
        image: &DynamicImage,
        filter: NamedFilter,
    ) -> Result<DynamicImage, BackendError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::ProcessingFailed(
                "cannot filter an empty image".to_string(),
            ));
        }
        let filtered = kernels::convolve(&image.to_rgba8(), filter.kernel());
        Ok(restore_color(image.color(), filtered))
    }

    fn enhance(
        &self,
        image: &DynamicImage,
        enhancement: Enhancement,
        factor: f32,
    ) -> Result<DynamicImage, BackendError> {
        if !factor.is_finite() {
            return Err(BackendError::ProcessingFailed(format!(
                "{enhancement:?} factor {factor} is not finite"
            )));
        }
        if factor == 1.0 {
            return Ok(image.clone());
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::ProcessingFailed(
                "cannot enhance an empty image".to_string(),
            ));
        }
        let rgba = image.to_rgba8();
        let degenerate = degenerate_for(enhancement, &rgba);
        Ok(restore_color(image.color(), blend(&degenerate, &rgba, factor)))
    }

    fn grayscale(&self, image: &DynamicImage) -> Result<DynamicImage, BackendError> {
        let rgba = image.to_rgba8();
        let gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            Luma([luma(rgba.get_pixel(x, y))])
        });
        Ok(DynamicImage::ImageLuma8(gray))
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, BackendError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BackendError::ProcessingFailed(
                "cannot remove the background of an empty image".to_string(),
            ));
        }
        let mut rgba = image.to_rgba8();
        let mask = background_mask(&rgba, self.background_tolerance);
        for (pixel, background) in rgba.pixels_mut().zip(mask) {
            if background {
                pixel.0[3] = 0;
            }
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}
