//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which validates loosely-typed request values into these types) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! String forms are matched case-insensitively, and `_` is read as `-`, so
//! `ANTI_CLOCKWISE`, `anti-clockwise` and `Anti_Clockwise` are the same value.

/// Canonical spelling of an enumerated request value.
fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('_', "-")
}

/// Which side `dimparam` fixes in a keep-ratio resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionType {
    Width,
    Height,
}

impl DimensionType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "w" | "width" => Some(Self::Width),
            "h" | "height" => Some(Self::Height),
            _ => None,
        }
    }
}

/// Rotation direction. Positive angles are anti-clockwise unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrientation {
    Clockwise,
    #[default]
    AntiClockwise,
}

impl RotationOrientation {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "clockwise" => Some(Self::Clockwise),
            "anti-clockwise" | "anticlockwise" => Some(Self::AntiClockwise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    /// Mirror left ↔ right.
    Horizontal,
    /// Mirror top ↔ bottom.
    Vertical,
}

impl FlipDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// The fixed set of named convolution filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedFilter {
    Blur,
    Contour,
    Detail,
    EdgeEnhance,
    EdgeEnhanceMore,
    Emboss,
    FindEdges,
    Sharpen,
    Smooth,
    SmoothMore,
}

impl NamedFilter {
    pub const ALL: &'static [NamedFilter] = &[
        NamedFilter::Blur,
        NamedFilter::Contour,
        NamedFilter::Detail,
        NamedFilter::EdgeEnhance,
        NamedFilter::EdgeEnhanceMore,
        NamedFilter::Emboss,
        NamedFilter::FindEdges,
        NamedFilter::Sharpen,
        NamedFilter::Smooth,
        NamedFilter::SmoothMore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Contour => "contour",
            Self::Detail => "detail",
            Self::EdgeEnhance => "edge-enhance",
            Self::EdgeEnhanceMore => "edge-enhance-more",
            Self::Emboss => "emboss",
            Self::FindEdges => "find-edges",
            Self::Sharpen => "sharpen",
            Self::Smooth => "smooth",
            Self::SmoothMore => "smooth-more",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = normalize(value);
        Self::ALL.iter().copied().find(|f| f.name() == wanted)
    }
}

/// One colour enhancement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enhancement {
    Brightness,
    Contrast,
    /// Saturation.
    Color,
    Sharpness,
}

/// Multipliers for a colour filter. 1.0 leaves a channel property unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAdjustment {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
}

impl ColorAdjustment {
    /// Steps in application order. Each step works on the previous result.
    pub fn steps(&self) -> [(Enhancement, f32); 4] {
        [
            (Enhancement::Brightness, self.brightness),
            (Enhancement::Contrast, self.contrast),
            (Enhancement::Color, self.saturation),
            (Enhancement::Sharpness, self.sharpness),
        ]
    }
}

/// Crop rectangle `[left, top, right, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}
