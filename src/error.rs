//! The flat error taxonomy shared by validation, dispatch and every operation.
//!
//! One variant per root cause. Each variant carries the human-readable message
//! that ends up in the `errorMessage` field of the response envelope, so the
//! `Display` impl is just that message.
//!
//! Variants fall into three origins (see [`ErrorOrigin`]):
//!
//! | Origin | Raised by | Caller's fault? |
//! |---|---|---|
//! | Shape | [`command::validate`](crate::command::validate) | yes |
//! | Value | each operation's own parameter checks | yes |
//! | Transformation | an operation whose backend call failed | no |

use thiserror::Error;

/// Where an [`OperationError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// The command descriptor itself is badly shaped.
    Shape,
    /// A parameter value is out of range or of the wrong type.
    Value,
    /// The image capability failed while performing a valid operation.
    Transformation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    // Shape
    #[error("{0}")]
    MalformedCommand(String),
    #[error("{0}")]
    UnknownCategory(String),
    #[error("{0}")]
    UnknownOperation(String),
    #[error("{0}")]
    OperationCategoryMismatch(String),
    #[error("{0}")]
    MissingParameters(String),
    #[error("{0}")]
    UnexpectedParameters(String),
    #[error("{0}")]
    ParameterNameMismatch(String),

    // Value
    #[error("{0}")]
    InvalidCoordinateType(String),
    #[error("{0}")]
    InvalidCoordinate(String),
    #[error("{0}")]
    InvalidSizeParameter(String),
    #[error("{0}")]
    InvalidSizeParameterType(String),
    #[error("{0}")]
    InvalidRotationDegree(String),
    #[error("{0}")]
    InvalidRotationOrientation(String),
    #[error("{0}")]
    InvalidFlippingDirection(String),
    #[error("{0}")]
    InvalidFilter(String),
    #[error("{0}")]
    InvalidColorParameter(String),
    #[error("{0}")]
    UnauthorizedImageFormat(String),
    #[error("{0}")]
    SameFormat(String),

    // Transformation
    #[error("{0}")]
    ImageConversion(String),
    #[error("{0}")]
    ImageCropping(String),
    #[error("{0}")]
    ImageResizing(String),
    #[error("{0}")]
    ImagePositionModifying(String),
    #[error("{0}")]
    ImageColorFiltering(String),
    #[error("{0}")]
    BackgroundRemoval(String),
}

impl OperationError {
    pub fn origin(&self) -> ErrorOrigin {
        use OperationError::*;
        match self {
            MalformedCommand(_)
            | UnknownCategory(_)
            | UnknownOperation(_)
            | OperationCategoryMismatch(_)
            | MissingParameters(_)
            | UnexpectedParameters(_)
            | ParameterNameMismatch(_) => ErrorOrigin::Shape,
            InvalidCoordinateType(_)
            | InvalidCoordinate(_)
            | InvalidSizeParameter(_)
            | InvalidSizeParameterType(_)
            | InvalidRotationDegree(_)
            | InvalidRotationOrientation(_)
            | InvalidFlippingDirection(_)
            | InvalidFilter(_)
            | InvalidColorParameter(_)
            | UnauthorizedImageFormat(_)
            | SameFormat(_) => ErrorOrigin::Value,
            ImageConversion(_)
            | ImageCropping(_)
            | ImageResizing(_)
            | ImagePositionModifying(_)
            | ImageColorFiltering(_)
            | BackgroundRemoval(_) => ErrorOrigin::Transformation,
        }
    }

    /// True when the request, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self.origin(), ErrorOrigin::Shape | ErrorOrigin::Value)
    }

    /// HTTP-style status classification for the response envelope.
    ///
    /// A failed transformation is reported against the request that asked
    /// for it, so every operation error is a 400. Only failures outside the
    /// operations (staging, encoding the response) are 500s.
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Stable name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        use OperationError::*;
        match self {
            MalformedCommand(_) => "MalformedCommand",
            UnknownCategory(_) => "UnknownCategory",
            UnknownOperation(_) => "UnknownOperation",
            OperationCategoryMismatch(_) => "OperationCategoryMismatch",
            MissingParameters(_) => "MissingParameters",
            UnexpectedParameters(_) => "UnexpectedParameters",
            ParameterNameMismatch(_) => "ParameterNameMismatch",
            InvalidCoordinateType(_) => "InvalidCoordinateType",
            InvalidCoordinate(_) => "InvalidCoordinate",
            InvalidSizeParameter(_) => "InvalidSizeParameter",
            InvalidSizeParameterType(_) => "InvalidSizeParameterType",
            InvalidRotationDegree(_) => "InvalidRotationDegree",
            InvalidRotationOrientation(_) => "InvalidRotationOrientation",
            InvalidFlippingDirection(_) => "InvalidFlippingDirection",
            InvalidFilter(_) => "InvalidFilter",
            InvalidColorParameter(_) => "InvalidColorParameter",
            UnauthorizedImageFormat(_) => "UnauthorizedImageFormat",
            SameFormat(_) => "SameFormatError",
            ImageConversion(_) => "ImageConversionError",
            ImageCropping(_) => "ImageCroppingError",
            ImageResizing(_) => "ImageResizingError",
            ImagePositionModifying(_) => "ImagePositionModifyingError",
            ImageColorFiltering(_) => "ImageColorFilteringError",
            BackgroundRemoval(_) => "BackgroundRemovalError",
        }
    }

    /// The message carried by the variant.
    pub fn message(&self) -> &str {
        use OperationError::*;
        match self {
            MalformedCommand(m)
            | UnknownCategory(m)
            | UnknownOperation(m)
            | OperationCategoryMismatch(m)
            | MissingParameters(m)
            | UnexpectedParameters(m)
            | ParameterNameMismatch(m)
            | InvalidCoordinateType(m)
            | InvalidCoordinate(m)
            | InvalidSizeParameter(m)
            | InvalidSizeParameterType(m)
            | InvalidRotationDegree(m)
            | InvalidRotationOrientation(m)
            | InvalidFlippingDirection(m)
            | InvalidFilter(m)
            | InvalidColorParameter(m)
            | UnauthorizedImageFormat(m)
            | SameFormat(m)
            | ImageConversion(m)
            | ImageCropping(m)
            | ImageResizing(m)
            | ImagePositionModifying(m)
            | ImageColorFiltering(m)
            | BackgroundRemoval(m) => m,
        }
    }
}
