//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Divisions truncate toward zero; output sizes are never rounded up.

use super::params::{DimensionType, RotationOrientation};

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Calculate dimensions for a resize that fixes one side and keeps the ratio.
///
/// The free side is `original_opposite * dimparam / original_matching`,
/// truncated.
///
/// # Examples
/// ```
/// # use imagehacker::imaging::{keep_ratio_dimensions, DimensionType};
/// // 400x200, height fixed at 100 → 200x100
/// assert_eq!(keep_ratio_dimensions((400, 200), 100, DimensionType::Height), (200, 100));
/// ```
pub fn keep_ratio_dimensions(
    original: (u32, u32),
    dimparam: u32,
    dimension: DimensionType,
) -> (u32, u32) {
    let (width, height) = original;
    match dimension {
        DimensionType::Width => {
            let new_height = if width == 0 {
                0
            } else {
                saturate(height as u64 * dimparam as u64 / width as u64)
            };
            (dimparam, new_height)
        }
        DimensionType::Height => {
            let new_width = if height == 0 {
                0
            } else {
                saturate(width as u64 * dimparam as u64 / height as u64)
            };
            (new_width, dimparam)
        }
    }
}

/// Scale both sides by `percentage / 100`, truncating each side on its own.
///
/// # Examples
/// ```
/// # use imagehacker::imaging::percentage_dimensions;
/// assert_eq!(percentage_dimensions((300, 200), 33), (99, 66));
/// ```
pub fn percentage_dimensions(original: (u32, u32), percentage: u32) -> (u32, u32) {
    let (width, height) = original;
    (
        saturate(width as u64 * percentage as u64 / 100),
        saturate(height as u64 * percentage as u64 / 100),
    )
}

/// The last valid pixel coordinate, `(width - 1, height - 1)`.
///
/// Signed so an empty image yields `-1` rather than wrapping.
pub fn bottom_right_corner(dimensions: (u32, u32)) -> (i64, i64) {
    (dimensions.0 as i64 - 1, dimensions.1 as i64 - 1)
}

/// Rotation angle in the backend's convention (positive = anti-clockwise).
///
/// Clockwise is the negation of the same magnitude.
pub fn signed_rotation(degrees: u32, orientation: RotationOrientation) -> i32 {
    let magnitude = degrees as i32;
    match orientation {
        RotationOrientation::AntiClockwise => magnitude,
        RotationOrientation::Clockwise => -magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // keep_ratio_dimensions tests
    // =========================================================================

    #[test]
    fn keep_ratio_fixed_height() {
        assert_eq!(
            keep_ratio_dimensions((400, 200), 100, DimensionType::Height),
            (200, 100)
        );
    }

    #[test]
    fn keep_ratio_fixed_width() {
        assert_eq!(
            keep_ratio_dimensions((400, 200), 100, DimensionType::Width),
            (100, 50)
        );
    }

    #[test]
    fn keep_ratio_truncates_instead_of_rounding() {
        // 300x200 → width 100: 200 * 100 / 300 = 66.67 → 66
        assert_eq!(
            keep_ratio_dimensions((300, 200), 100, DimensionType::Width),
            (100, 66)
        );
        // 7x3 → height 2: 7 * 2 / 3 = 4.67 → 4
        assert_eq!(
            keep_ratio_dimensions((7, 3), 2, DimensionType::Height),
            (4, 2)
        );
    }

    #[test]
    fn keep_ratio_can_collapse_to_zero() {
        assert_eq!(
            keep_ratio_dimensions((1000, 10), 50, DimensionType::Width),
            (50, 0)
        );
    }

    #[test]
    fn keep_ratio_upscales() {
        assert_eq!(
            keep_ratio_dimensions((40, 30), 400, DimensionType::Width),
            (400, 300)
        );
    }

    // =========================================================================
    // percentage_dimensions tests
    // =========================================================================

    #[test]
    fn percentage_half() {
        assert_eq!(percentage_dimensions((300, 200), 50), (150, 100));
    }

    #[test]
    fn percentage_truncates_each_axis_independently() {
        // 300 * 33 / 100 = 99, 200 * 33 / 100 = 66
        assert_eq!(percentage_dimensions((300, 200), 33), (99, 66));
        // 101 * 50 / 100 = 50.5 → 50, 99 * 50 / 100 = 49.5 → 49
        assert_eq!(percentage_dimensions((101, 99), 50), (50, 49));
    }

    #[test]
    fn percentage_above_hundred_enlarges() {
        assert_eq!(percentage_dimensions((10, 20), 250), (25, 50));
    }

    // =========================================================================
    // crop bounds and rotation sign
    // =========================================================================

    #[test]
    fn bottom_right_is_last_pixel_not_size() {
        assert_eq!(bottom_right_corner((640, 480)), (639, 479));
        assert_eq!(bottom_right_corner((0, 0)), (-1, -1));
    }

    #[test]
    fn clockwise_negates_the_angle() {
        assert_eq!(signed_rotation(90, RotationOrientation::AntiClockwise), 90);
        assert_eq!(signed_rotation(90, RotationOrientation::Clockwise), -90);
        assert_eq!(signed_rotation(0, RotationOrientation::Clockwise), 0);
    }
}
