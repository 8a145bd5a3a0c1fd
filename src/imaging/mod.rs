//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` codecs (BMP, ICO, JPEG, PNG) |
//! | **Crop, resize, flip** | `image::DynamicImage` |
//! | **Rotate** | `imageproc::geometric_transformations` |
//! | **Named filters** | kernel table + convolution |
//! | **Colour filter** | four enhancement blends |
//! | **Background removal** | border flood fill |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Kernels**: The named convolution filters
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: One function per editing operation, validating values
//!   and calling the backend

pub mod backend;
mod calculations;
mod kernels;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{keep_ratio_dimensions, percentage_dimensions};
pub use params::{
    ColorAdjustment, CropRect, DimensionType, Enhancement, FlipDirection, NamedFilter,
    RotationOrientation,
};
pub use rust_backend::RustBackend;
