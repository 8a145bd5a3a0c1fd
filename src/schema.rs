//! Schema registry: operation category → operations → parameter names.
//!
//! The whole taxonomy lives in this file. Categories and operations are closed
//! enums, and every per-operation fact (its category, its parameter names) is
//! an exhaustive `match`, so adding an operation is a compile error everywhere
//! it has not been handled yet.
//!
//! Names on the wire are the camelCase keys the front-end sends (`bgRemove`,
//! `resizeKeepRatio`, ...). Each category and operation also answers to a
//! kebab-case alias (`background-removal`, `resize-keep-ratio`, ...).
//!
//! ```text
//! bgRemove   → bgRemove                              (no parameters)
//! convert    → convert                               outputImageFormat
//! crop       → crop                                  x1 y1 x2 y2
//! filter     → filter                                filter
//!            → transformBlackNWhite                  (no parameters)
//!            → colorFilter                           brightness contrast saturation sharpness
//! posModify  → rotate                                degrees orientation
//!            → flip                                  direction
//! resize     → resize                                width height
//!            → resizeKeepRatio                       dimparam dimparamType
//!            → resizeByPercentage                    percentage
//! ```

use crate::error::OperationError;
use serde::Serialize;

/// Coarse grouping of related edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationCategory {
    BackgroundRemoval,
    FormatConversion,
    Crop,
    Filter,
    PositionModify,
    Resize,
}

/// One concrete edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    BackgroundRemoval,
    Convert,
    Crop,
    Filter,
    BlackAndWhite,
    ColorFilter,
    Rotate,
    Flip,
    Resize,
    ResizeKeepRatio,
    ResizeByPercentage,
}

const CATEGORIES: &[OperationCategory] = &[
    OperationCategory::BackgroundRemoval,
    OperationCategory::FormatConversion,
    OperationCategory::Crop,
    OperationCategory::Filter,
    OperationCategory::PositionModify,
    OperationCategory::Resize,
];

impl OperationCategory {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "bgRemove",
            Self::FormatConversion => "convert",
            Self::Crop => "crop",
            Self::Filter => "filter",
            Self::PositionModify => "posModify",
            Self::Resize => "resize",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "background-removal",
            Self::FormatConversion => "format-conversion",
            Self::Crop => "crop",
            Self::Filter => "filter",
            Self::PositionModify => "position-modify",
            Self::Resize => "resize",
        }
    }

    /// Look a category up by its wire name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        CATEGORIES
            .iter()
            .copied()
            .find(|c| c.wire_name() == name || c.alias() == name)
    }

    /// Operations allowed under this category.
    pub fn operations(self) -> &'static [Operation] {
        match self {
            Self::BackgroundRemoval => &[Operation::BackgroundRemoval],
            Self::FormatConversion => &[Operation::Convert],
            Self::Crop => &[Operation::Crop],
            Self::Filter => &[
                Operation::Filter,
                Operation::BlackAndWhite,
                Operation::ColorFilter,
            ],
            Self::PositionModify => &[Operation::Rotate, Operation::Flip],
            Self::Resize => &[
                Operation::Resize,
                Operation::ResizeKeepRatio,
                Operation::ResizeByPercentage,
            ],
        }
    }
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::BackgroundRemoval,
        Operation::Convert,
        Operation::Crop,
        Operation::Filter,
        Operation::BlackAndWhite,
        Operation::ColorFilter,
        Operation::Rotate,
        Operation::Flip,
        Operation::Resize,
        Operation::ResizeKeepRatio,
        Operation::ResizeByPercentage,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "bgRemove",
            Self::Convert => "convert",
            Self::Crop => "crop",
            Self::Filter => "filter",
            Self::BlackAndWhite => "transformBlackNWhite",
            Self::ColorFilter => "colorFilter",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
            Self::Resize => "resize",
            Self::ResizeKeepRatio => "resizeKeepRatio",
            Self::ResizeByPercentage => "resizeByPercentage",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "background-removal",
            Self::Convert => "format-conversion",
            Self::Crop => "crop",
            Self::Filter => "filter",
            Self::BlackAndWhite => "black-and-white",
            Self::ColorFilter => "color-filter",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
            Self::Resize => "resize",
            Self::ResizeKeepRatio => "resize-keep-ratio",
            Self::ResizeByPercentage => "resize-by-percentage",
        }
    }

    /// Look an operation up by its wire name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.wire_name() == name || op.alias() == name)
    }

    /// The single category this operation belongs to.
    pub fn category(self) -> OperationCategory {
        match self {
            Self::BackgroundRemoval => OperationCategory::BackgroundRemoval,
            Self::Convert => OperationCategory::FormatConversion,
            Self::Crop => OperationCategory::Crop,
            Self::Filter | Self::BlackAndWhite | Self::ColorFilter => OperationCategory::Filter,
            Self::Rotate | Self::Flip => OperationCategory::PositionModify,
            Self::Resize | Self::ResizeKeepRatio | Self::ResizeByPercentage => {
                OperationCategory::Resize
            }
        }
    }

    /// Required parameter names, or `None` for operations that take none.
    pub fn parameters(self) -> Option<&'static [&'static str]> {
        match self {
            Self::BackgroundRemoval | Self::BlackAndWhite => None,
            Self::Convert => Some(&["outputImageFormat"]),
            Self::Crop => Some(&["x1", "y1", "x2", "y2"]),
            Self::Filter => Some(&["filter"]),
            Self::ColorFilter => Some(&["brightness", "contrast", "saturation", "sharpness"]),
            Self::Rotate => Some(&["degrees", "orientation"]),
            Self::Flip => Some(&["direction"]),
            Self::Resize => Some(&["width", "height"]),
            Self::ResizeKeepRatio => Some(&["dimparam", "dimparamType"]),
            Self::ResizeByPercentage => Some(&["percentage"]),
        }
    }
}

/// All categories, in registry order.
pub fn categories() -> &'static [OperationCategory] {
    CATEGORIES
}

/// Operations of a category given by name.
pub fn operations_of(category: &str) -> Result<&'static [Operation], OperationError> {
    OperationCategory::from_name(category)
        .map(OperationCategory::operations)
        .ok_or_else(|| {
            OperationError::UnknownCategory(format!(
                "The action category: \"{category}\" is invalid."
            ))
        })
}

/// Parameter names of an operation given by name.
pub fn parameters_of(operation: &str) -> Result<Option<&'static [&'static str]>, OperationError> {
    Operation::from_name(operation)
        .map(Operation::parameters)
        .ok_or_else(|| {
            OperationError::UnknownOperation(format!("The action: \"{operation}\" is invalid."))
        })
}

/// Serializable view of one category, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDescription {
    pub category: &'static str,
    pub alias: &'static str,
    pub operations: Vec<OperationDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationDescription {
    pub operation: &'static str,
    pub alias: &'static str,
    pub parameters: Option<Vec<&'static str>>,
}

/// The full registry as plain data.
pub fn describe() -> Vec<CategoryDescription> {
    categories()
        .iter()
        .map(|&category| CategoryDescription {
            category: category.wire_name(),
            alias: category.alias(),
            operations: category
                .operations()
                .iter()
                .map(|&op| OperationDescription {
                    operation: op.wire_name(),
                    alias: op.alias(),
                    parameters: op.parameters().map(|names| names.to_vec()),
                })
                .collect(),
        })
        .collect()
}
