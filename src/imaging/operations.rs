//! High-level image operations.
//!
//! Each function validates its own loosely-typed parameter values, computes
//! the geometry with [`calculations`](super::calculations), and calls the
//! backend. Backend failures are logged and folded into the operation's
//! generic transformation error; the backend message never reaches callers.
//!
//! Every result keeps the source format except [`convert`], which takes the
//! target format.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    bottom_right_corner, keep_ratio_dimensions, percentage_dimensions, signed_rotation,
};
use super::params::{
    ColorAdjustment, CropRect, DimensionType, FlipDirection, NamedFilter, RotationOrientation,
};
use crate::artifact::{ImageArtifact, ImageFormatTag};
use crate::command::ParamValue;
use crate::error::OperationError;
use crate::schema::Operation;
use tracing::{debug, error};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Log a backend failure and replace it with the caller-facing error.
fn fold<T>(
    result: std::result::Result<T, BackendError>,
    operation: Operation,
    into: impl FnOnce() -> OperationError,
) -> Result<T> {
    result.map_err(|err| {
        error!(operation = operation.wire_name(), error = %err, "image backend failed");
        into()
    })
}

/// A strictly positive integer that fits a pixel dimension.
fn positive_dimension(value: &ParamValue) -> Option<u32> {
    value
        .as_int()
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

fn resize_to(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    operation: Operation,
    (width, height): (u32, u32),
) -> Result<ImageArtifact> {
    debug!(
        operation = operation.wire_name(),
        from = ?artifact.dimensions(),
        to = ?(width, height),
        codec = artifact.format().codec_name(),
        "resizing"
    );
    let image = fold(backend.resize(artifact.image(), width, height), operation, || {
        OperationError::ImageResizing(
            "An unknown error occurred while trying to resize the image.".to_string(),
        )
    })?;
    Ok(artifact.derive(image))
}

// ============================================================================
// Background removal
// ============================================================================

/// Make the background transparent. PNG input only.
pub fn remove_background(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
) -> Result<ImageArtifact> {
    if artifact.format() != ImageFormatTag::Png {
        return Err(OperationError::UnauthorizedImageFormat(
            "Only PNG image files can have their backgrounds removed.".to_string(),
        ));
    }
    let image = fold(
        backend.remove_background(artifact.image()),
        Operation::BackgroundRemoval,
        || {
            OperationError::BackgroundRemoval(
                "An unknown error occurred while trying to remove the background \
                 from the given image."
                    .to_string(),
            )
        },
    )?;
    Ok(artifact.derive(image))
}

// ============================================================================
// Format conversion
// ============================================================================

/// Re-encode into another of the four accepted formats.
pub fn convert(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    output_format: &ParamValue,
) -> Result<ImageArtifact> {
    let target = output_format
        .as_text()
        .and_then(ImageFormatTag::parse)
        .ok_or_else(|| {
            OperationError::UnauthorizedImageFormat(format!(
                "Cannot convert to {output_format} because it is unauthorized."
            ))
        })?;

    if target == artifact.format() {
        return Err(OperationError::SameFormat(format!(
            "Cannot convert to {target} because input and output image formats are the same."
        )));
    }

    debug!(from = artifact.format().codec_name(), to = target.codec_name(), "converting");
    let image = fold(
        backend.convert(artifact.image(), target),
        Operation::Convert,
        || {
            OperationError::ImageConversion(format!(
                "An unknown error occurred while trying to convert image to the {} format.",
                target.name()
            ))
        },
    )?;
    Ok(ImageArtifact::new(image, target))
}

// ============================================================================
// Crop
// ============================================================================

/// Crop to the half-open rectangle `[x1, x2) x [y1, y2)`.
///
/// `(x2, y2)` may be at most the last pixel, `(width - 1, height - 1)`.
pub fn crop(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    x1: &ParamValue,
    y1: &ParamValue,
    x2: &ParamValue,
    y2: &ParamValue,
) -> Result<ImageArtifact> {
    let (Some(x1), Some(y1), Some(x2), Some(y2)) =
        (x1.as_int(), y1.as_int(), x2.as_int(), y2.as_int())
    else {
        return Err(OperationError::InvalidCoordinateType(
            "Coordinates must be integers.".to_string(),
        ));
    };

    if [x1, y1, x2, y2].iter().any(|&c| c < 0) {
        return Err(OperationError::InvalidCoordinate(
            "Coordinates must be positive integers.".to_string(),
        ));
    }
    if x2 <= x1 {
        return Err(OperationError::InvalidCoordinate(
            "Right coordinate must be greater than left coordinate.".to_string(),
        ));
    }
    if y2 <= y1 {
        return Err(OperationError::InvalidCoordinate(
            "Bottom coordinate must be greater than top coordinate.".to_string(),
        ));
    }
    let (max_x, max_y) = bottom_right_corner(artifact.dimensions());
    if x2 > max_x || y2 > max_y {
        return Err(OperationError::InvalidCoordinate(
            "The coordinates of the bottom-right point are out of bounds.".to_string(),
        ));
    }

    // all four are within 0..=u32::MAX - 1 after the bounds check
    let rect = CropRect {
        left: x1 as u32,
        top: y1 as u32,
        right: x2 as u32,
        bottom: y2 as u32,
    };
    let image = fold(backend.crop(artifact.image(), rect), Operation::Crop, || {
        OperationError::ImageCropping(
            "An unknown error occurred while trying to crop the image.".to_string(),
        )
    })?;
    Ok(artifact.derive(image))
}

// ============================================================================
// Filters
// ============================================================================

fn color_filtering_failed() -> OperationError {
    OperationError::ImageColorFiltering(
        "An unknown error occurred while applying color filters to the image.".to_string(),
    )
}

/// Apply one of the named convolution filters.
pub fn filter(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    name: &ParamValue,
) -> Result<ImageArtifact> {
    let named = name
        .as_text()
        .and_then(NamedFilter::parse)
        .ok_or_else(|| OperationError::InvalidFilter(format!("{name} is an invalid filter.")))?;

    let image = fold(
        backend.filter(artifact.image(), named),
        Operation::Filter,
        color_filtering_failed,
    )?;
    Ok(artifact.derive(image))
}

/// Reduce to single-channel luminance.
pub fn black_and_white(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
) -> Result<ImageArtifact> {
    let image = fold(
        backend.grayscale(artifact.image()),
        Operation::BlackAndWhite,
        color_filtering_failed,
    )?;
    Ok(artifact.derive(image))
}

/// Brightness, contrast, saturation and sharpness, applied in that order.
pub fn color_filter(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    brightness: &ParamValue,
    contrast: &ParamValue,
    saturation: &ParamValue,
    sharpness: &ParamValue,
) -> Result<ImageArtifact> {
    let (Some(brightness), Some(contrast), Some(saturation), Some(sharpness)) = (
        brightness.as_number(),
        contrast.as_number(),
        saturation.as_number(),
        sharpness.as_number(),
    ) else {
        return Err(OperationError::InvalidColorParameter(
            "Color parameters must be numbers.".to_string(),
        ));
    };

    let adjustment = ColorAdjustment {
        brightness: brightness as f32,
        contrast: contrast as f32,
        saturation: saturation as f32,
        sharpness: sharpness as f32,
    };

    let mut image = artifact.image().clone();
    for (enhancement, factor) in adjustment.steps() {
        image = fold(
            backend.enhance(&image, enhancement, factor),
            Operation::ColorFilter,
            color_filtering_failed,
        )?;
    }
    Ok(artifact.derive(image))
}

// ============================================================================
// Position
// ============================================================================

/// Rotate by 0..=360 degrees, anti-clockwise unless told otherwise.
pub fn rotate(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    degrees: &ParamValue,
    orientation: &ParamValue,
) -> Result<ImageArtifact> {
    let degrees = degrees
        .as_int()
        .filter(|d| (0..=360).contains(d))
        .ok_or_else(|| {
            OperationError::InvalidRotationDegree(
                "The rotation degree must be a positive integer between 0 and 360.".to_string(),
            )
        })?;
    let orientation = orientation
        .as_text()
        .and_then(RotationOrientation::parse)
        .ok_or_else(|| {
            OperationError::InvalidRotationOrientation(format!(
                "{orientation} is an invalid rotation orientation."
            ))
        })?;

    let angle = signed_rotation(degrees as u32, orientation);
    debug!(degrees, ?orientation, angle, "rotating");
    let image = fold(backend.rotate(artifact.image(), angle), Operation::Rotate, || {
        OperationError::ImagePositionModifying(
            "An unknown error occurred while trying to rotate the image.".to_string(),
        )
    })?;
    Ok(artifact.derive(image))
}

pub fn flip(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    direction: &ParamValue,
) -> Result<ImageArtifact> {
    let parsed = direction
        .as_text()
        .and_then(FlipDirection::parse)
        .ok_or_else(|| {
            OperationError::InvalidFlippingDirection(format!(
                "{direction} is an invalid flipping direction."
            ))
        })?;

    let image = fold(backend.flip(artifact.image(), parsed), Operation::Flip, || {
        OperationError::ImagePositionModifying(
            "An unknown error occurred while trying to flip the image.".to_string(),
        )
    })?;
    Ok(artifact.derive(image))
}

// ============================================================================
// Resize
// ============================================================================

/// Resize to exactly `width` x `height`.
pub fn resize(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    width: &ParamValue,
    height: &ParamValue,
) -> Result<ImageArtifact> {
    let (Some(width), Some(height)) = (positive_dimension(width), positive_dimension(height))
    else {
        return Err(OperationError::InvalidSizeParameter(
            "Width and height parameters must be positive integers.".to_string(),
        ));
    };
    resize_to(backend, artifact, Operation::Resize, (width, height))
}

/// Fix one side and scale the other to keep the aspect ratio.
///
/// A computed side of zero is passed to the backend, which rejects it as a
/// resize failure.
pub fn resize_keep_ratio(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    dimparam: &ParamValue,
    dimparam_type: &ParamValue,
) -> Result<ImageArtifact> {
    let size = positive_dimension(dimparam).ok_or_else(|| {
        OperationError::InvalidSizeParameter(
            "Image size parameter must be a positive integer.".to_string(),
        )
    })?;
    let dimension = dimparam_type
        .as_text()
        .and_then(DimensionType::parse)
        .ok_or_else(|| {
            OperationError::InvalidSizeParameterType(format!(
                "The given image size parameter type {dimparam_type} is invalid."
            ))
        })?;

    let target = keep_ratio_dimensions(artifact.dimensions(), size, dimension);
    resize_to(backend, artifact, Operation::ResizeKeepRatio, target)
}

/// Scale both sides by `percentage / 100`.
pub fn resize_by_percentage(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    percentage: &ParamValue,
) -> Result<ImageArtifact> {
    let percentage = positive_dimension(percentage).ok_or_else(|| {
        OperationError::InvalidSizeParameter(
            "Image size parameter must be a positive integer.".to_string(),
        )
    })?;
    let target = percentage_dimensions(artifact.dimensions(), percentage);
    resize_to(backend, artifact, Operation::ResizeByPercentage, target)
}
