//! Route a validated command to its operation.
//!
//! The match over [`Operation`] is exhaustive, so adding an operation to the
//! schema without routing it here is a compile error. Parameters are handed
//! over by name in the order the operation declares them.

use crate::artifact::ImageArtifact;
use crate::command::CommandDescriptor;
use crate::error::OperationError;
use crate::imaging::ImageBackend;
use crate::imaging::operations;
use crate::schema::Operation;
use tracing::{debug, info_span};

/// Run `command` against `artifact` and return the transformed artifact.
pub fn dispatch(
    backend: &impl ImageBackend,
    artifact: &ImageArtifact,
    command: &CommandDescriptor,
) -> Result<ImageArtifact, OperationError> {
    let operation = command.operation();
    let _span = info_span!(
        "dispatch",
        category = operation.category().wire_name(),
        operation = operation.wire_name()
    )
    .entered();
    debug!(format = %artifact.format(), dimensions = ?artifact.dimensions(), "dispatching");

    let p = |name: &str| command.param(name);
    match operation {
        Operation::BackgroundRemoval => operations::remove_background(backend, artifact),
        Operation::Convert => operations::convert(backend, artifact, p("outputImageFormat")?),
        Operation::Crop => operations::crop(
            backend,
            artifact,
            p("x1")?,
            p("y1")?,
            p("x2")?,
            p("y2")?,
        ),
        Operation::Filter => operations::filter(backend, artifact, p("filter")?),
        Operation::BlackAndWhite => operations::black_and_white(backend, artifact),
        Operation::ColorFilter => operations::color_filter(
            backend,
            artifact,
            p("brightness")?,
            p("contrast")?,
            p("saturation")?,
            p("sharpness")?,
        ),
        Operation::Rotate => {
            operations::rotate(backend, artifact, p("degrees")?, p("orientation")?)
        }
        Operation::Flip => operations::flip(backend, artifact, p("direction")?),
        Operation::Resize => operations::resize(backend, artifact, p("width")?, p("height")?),
        Operation::ResizeKeepRatio => operations::resize_keep_ratio(
            backend,
            artifact,
            p("dimparam")?,
            p("dimparamType")?,
        ),
        Operation::ResizeByPercentage => {
            operations::resize_by_percentage(backend, artifact, p("percentage")?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ImageFormatTag;
    use crate::command::{ParameterSet, validate};
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{FlipDirection, NamedFilter};
    use image::DynamicImage;
    use serde_json::json;

    fn png(width: u32, height: u32) -> ImageArtifact {
        ImageArtifact::new(DynamicImage::new_rgba8(width, height), ImageFormatTag::Png)
    }

    #[test]
    fn every_operation_routes_to_the_backend() {
        let cases = vec![
            (
                json!({"bgRemove": {"bgRemove": null}}),
                RecordedOp::RemoveBackground,
            ),
            (
                json!({"convert": {"convert": {"outputImageFormat": "bmp"}}}),
                RecordedOp::Convert(ImageFormatTag::Bmp),
            ),
            (
                json!({"filter": {"filter": {"filter": "blur"}}}),
                RecordedOp::Filter(NamedFilter::Blur),
            ),
            (
                json!({"filter": {"transformBlackNWhite": null}}),
                RecordedOp::Grayscale,
            ),
            (
                json!({"posModify": {"rotate": {"degrees": 45, "orientation": "clockwise"}}}),
                RecordedOp::Rotate(-45),
            ),
            (
                json!({"posModify": {"flip": {"direction": "vertical"}}}),
                RecordedOp::Flip(FlipDirection::Vertical),
            ),
            (
                json!({"resize": {"resize": {"width": 8, "height": 6}}}),
                RecordedOp::Resize {
                    width: 8,
                    height: 6,
                },
            ),
            (
                json!({"resize": {"resizeKeepRatio": {"dimparam": 10, "dimparamType": "w"}}}),
                RecordedOp::Resize {
                    width: 10,
                    height: 5,
                },
            ),
            (
                json!({"resize": {"resizeByPercentage": {"percentage": 50}}}),
                RecordedOp::Resize {
                    width: 10,
                    height: 5,
                },
            ),
        ];

        for (request, expected) in cases {
            let backend = MockBackend::new();
            let command = validate(&request).unwrap();
            dispatch(&backend, &png(20, 10), &command).unwrap();
            assert_eq!(backend.get_operations(), vec![expected], "{request}");
        }
    }

    #[test]
    fn crop_and_color_filter_bind_parameters_by_name() {
        let backend = MockBackend::new();
        // keys deliberately out of declaration order
        let action = json!({"crop": {"crop": {"y2": 9, "x1": 1, "y1": 2, "x2": 11}}});
        let crop = validate(&action).unwrap();
        let out = dispatch(&backend, &png(20, 10), &crop).unwrap();
        assert_eq!(out.dimensions(), (10, 7));

        let color = validate(&json!({"filter": {"colorFilter": {
            "sharpness": 4, "saturation": 3, "contrast": 2, "brightness": 1
        }}}))
        .unwrap();
        dispatch(&backend, &png(20, 10), &color).unwrap();
        let ops = backend.get_operations();
        assert!(matches!(
            ops[1],
            RecordedOp::Enhance(crate::imaging::Enhancement::Brightness, f) if f == 1.0
        ));
        assert!(matches!(
            ops[4],
            RecordedOp::Enhance(crate::imaging::Enhancement::Sharpness, f) if f == 4.0
        ));
    }

    #[test]
    fn value_errors_pass_through_unchanged() {
        let backend = MockBackend::new();
        let command = CommandDescriptor::new(
            Operation::Rotate,
            Some(
                ParameterSet::new()
                    .with("degrees", 720i64)
                    .with("orientation", "clockwise"),
            ),
        )
        .unwrap();
        let err = dispatch(&backend, &png(4, 4), &command).unwrap_err();
        assert!(matches!(err, OperationError::InvalidRotationDegree(_)));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn input_artifact_is_left_untouched() {
        let backend = MockBackend::new();
        let input = png(20, 10);
        let command = validate(&json!({"resize": {"resize": {"width": 3, "height": 3}}})).unwrap();
        let out = dispatch(&backend, &input, &command).unwrap();
        assert_eq!(out.dimensions(), (3, 3));
        assert_eq!(input.dimensions(), (20, 10));
    }
}
