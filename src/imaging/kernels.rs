//! The classic named convolution kernels and a small convolution routine.
//!
//! Each kernel output is `sum(weight * pixel) / scale + offset`, rounded and
//! clamped to `0..=255`. Colour channels are filtered, alpha is copied through.
//! Edge pixels read their nearest in-bounds neighbour.

use super::params::NamedFilter;
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    /// Side length, 3 or 5.
    pub size: u32,
    /// Row-major weights, `size * size` entries.
    pub weights: &'static [i32],
    pub scale: i32,
    pub offset: i32,
}

#[rustfmt::skip]
pub const BLUR: Kernel = Kernel {
    size: 5,
    weights: &[
        1, 1, 1, 1, 1,
        1, 0, 0, 0, 1,
        1, 0, 0, 0, 1,
        1, 0, 0, 0, 1,
        1, 1, 1, 1, 1,
    ],
    scale: 16,
    offset: 0,
};

#[rustfmt::skip]
pub const CONTOUR: Kernel = Kernel {
    size: 3,
    weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
    scale: 1,
    offset: 255,
};

#[rustfmt::skip]
pub const DETAIL: Kernel = Kernel {
    size: 3,
    weights: &[0, -1, 0, -1, 10, -1, 0, -1, 0],
    scale: 6,
    offset: 0,
};

#[rustfmt::skip]
pub const EDGE_ENHANCE: Kernel = Kernel {
    size: 3,
    weights: &[-1, -1, -1, -1, 10, -1, -1, -1, -1],
    scale: 2,
    offset: 0,
};

#[rustfmt::skip]
pub const EDGE_ENHANCE_MORE: Kernel = Kernel {
    size: 3,
    weights: &[-1, -1, -1, -1, 9, -1, -1, -1, -1],
    scale: 1,
    offset: 0,
};

#[rustfmt::skip]
pub const EMBOSS: Kernel = Kernel {
    size: 3,
    weights: &[-1, 0, 0, 0, 1, 0, 0, 0, 0],
    scale: 1,
    offset: 128,
};

#[rustfmt::skip]
pub const FIND_EDGES: Kernel = Kernel {
    size: 3,
    weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
    scale: 1,
    offset: 0,
};

#[rustfmt::skip]
pub const SHARPEN: Kernel = Kernel {
    size: 3,
    weights: &[-2, -2, -2, -2, 32, -2, -2, -2, -2],
    scale: 16,
    offset: 0,
};

#[rustfmt::skip]
pub const SMOOTH: Kernel = Kernel {
    size: 3,
    weights: &[1, 1, 1, 1, 5, 1, 1, 1, 1],
    scale: 13,
    offset: 0,
};

#[rustfmt::skip]
pub const SMOOTH_MORE: Kernel = Kernel {
    size: 5,
    weights: &[
        1, 1,  1, 1, 1,
        1, 5,  5, 5, 1,
        1, 5, 44, 5, 1,
        1, 5,  5, 5, 1,
        1, 1,  1, 1, 1,
    ],
    scale: 100,
    offset: 0,
};

impl NamedFilter {
    pub fn kernel(self) -> &'static Kernel {
        match self {
            Self::Blur => &BLUR,
            Self::Contour => &CONTOUR,
            Self::Detail => &DETAIL,
            Self::EdgeEnhance => &EDGE_ENHANCE,
            Self::EdgeEnhanceMore => &EDGE_ENHANCE_MORE,
            Self::Emboss => &EMBOSS,
            Self::FindEdges => &FIND_EDGES,
            Self::Sharpen => &SHARPEN,
            Self::Smooth => &SMOOTH,
            Self::SmoothMore => &SMOOTH_MORE,
        }
    }
}

/// Convolve the colour channels of `image` with `kernel`.
pub fn convolve(image: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let (width, height) = image.dimensions();
    let radius = (kernel.size / 2) as i64;
    let scale = if kernel.scale == 0 { 1.0 } else { kernel.scale as f32 };

    RgbaImage::from_fn(width, height, |x, y| {
        let mut acc = [0i32; 3];
        for ky in 0..kernel.size as i64 {
            for kx in 0..kernel.size as i64 {
                let weight = kernel.weights[(ky * kernel.size as i64 + kx) as usize];
                if weight == 0 {
                    continue;
                }
                let sx = (x as i64 + kx - radius).clamp(0, width as i64 - 1) as u32;
                let sy = (y as i64 + ky - radius).clamp(0, height as i64 - 1) as u32;
                let Rgba(p) = *image.get_pixel(sx, sy);
                for (channel, total) in acc.iter_mut().enumerate() {
                    *total += weight * p[channel] as i32;
                }
            }
        }
        let alpha = image.get_pixel(x, y)[3];
        let out = acc.map(|total| {
            (total as f32 / scale + kernel.offset as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        });
        Rgba([out[0], out[1], out[2], alpha])
    })
}
