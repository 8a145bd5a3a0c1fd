//! The request envelope: JSON in, JSON out.
//!
//! A request carries a base64 image, its declared format and one action:
//!
//! ```json
//! { "imageBase64URL": "iVBORw0KGgo...",
//!   "imageFormat": "png",
//!   "action": { "resize": { "resizeByPercentage": { "percentage": 50 } } } }
//! ```
//!
//! The inbound image is decoded, written to the request's own staging
//! directory in the declared format and read back; that raster is what the
//! action runs on. Success yields `{imageBase64URL, imageFormat}`, failure
//! yields `{errorMessage}` plus a status code.

use crate::artifact::{ImageArtifact, ImageFormatTag};
use crate::command::validate;
use crate::config::EditorConfig;
use crate::dispatch::dispatch;
use crate::error::OperationError;
use crate::imaging::ImageBackend;
use crate::staging::{RequestStage, StagingArea};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

/// Message returned for every internal failure; the detail is only logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "The server failed to process your request";

const IMPROPER_PAYLOAD: &str =
    "The given JSON payload does not contain proper data to edit the given image.";

/// Failures at the request boundary, wrapping operation errors.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("{0}")]
    MalformedRequest(String),
    #[error("{0}")]
    MissingField(String),
    #[error("{0}")]
    InvalidImageData(String),
    #[error("The request payload of {size} bytes exceeds the limit of {limit} bytes.")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Operation(#[from] OperationError),
    /// Staging I/O or result encoding failed. Never shown to callers.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl RequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequest(_) | Self::MissingField(_) | Self::InvalidImageData(_) => 400,
            Self::PayloadTooLarge { .. } => 413,
            Self::Operation(err) => err.status_code(),
            Self::Internal(_) => 500,
        }
    }

    /// Stable name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MalformedRequest",
            Self::MissingField(_) => "MissingField",
            Self::InvalidImageData(_) => "InvalidImageData",
            Self::PayloadTooLarge { .. } => "PayloadTooLarge",
            Self::Operation(err) => err.kind(),
            Self::Internal(_) => "Internal",
        }
    }

    /// True when the caller, not the engine, is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Operation(err) => err.is_client_error(),
            other => (400..500).contains(&other.status_code()),
        }
    }

    /// The message a caller is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Response body, serialized exactly as the wire expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success {
        #[serde(rename = "imageBase64URL")]
        image_base64: String,
        #[serde(rename = "imageFormat")]
        image_format: String,
    },
    Failure {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl EditResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success { .. })
    }

    pub fn from_error(err: &RequestError) -> Self {
        Self {
            status: err.status_code(),
            body: ResponseBody::Failure {
                error_message: err.public_message(),
            },
        }
    }

    /// The body as a JSON value.
    ///
    /// The body holds only strings, so serialization cannot fail.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.body).unwrap_or_default()
    }
}

/// A finished edit: the resulting artifact and its encoded bytes.
#[derive(Debug)]
pub struct EditOutcome {
    pub artifact: ImageArtifact,
    pub encoded: Vec<u8>,
}

/// Strip an optional `data:<mime>;base64,` prefix and whitespace, then decode.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, RequestError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).map_err(|_| {
        RequestError::InvalidImageData(
            "The encoded Base64 Image URL provided in this request is invalid".to_string(),
        )
    })
}

fn internal(context: &str, err: impl std::fmt::Display) -> RequestError {
    RequestError::Internal(format!("{context}: {err}"))
}

/// Runs edit requests against a backend, one staging directory per request.
pub struct EditorService<B: ImageBackend> {
    backend: B,
    staging: StagingArea,
    default_format: ImageFormatTag,
    max_payload_bytes: usize,
}

impl<B: ImageBackend> EditorService<B> {
    /// Service with PNG as the default format and no payload limit.
    pub fn new(backend: B, staging: StagingArea) -> Self {
        Self {
            backend,
            staging,
            default_format: ImageFormatTag::Png,
            max_payload_bytes: 0,
        }
    }

    pub fn from_config(backend: B, config: &EditorConfig) -> Self {
        Self::new(
            backend,
            StagingArea::from_root(config.staging.root.as_deref()),
        )
        .with_default_format(config.request.default_format_tag())
        .with_max_payload_bytes(config.request.max_payload_bytes)
    }

    pub fn with_default_format(mut self, format: ImageFormatTag) -> Self {
        self.default_format = format;
        self
    }

    /// Zero disables the limit.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle a raw request body.
    pub fn handle_json(&self, body: &str) -> EditResponse {
        if self.max_payload_bytes > 0 && body.len() > self.max_payload_bytes {
            let err = RequestError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_payload_bytes,
            };
            warn!(error = %err, "request rejected");
            return EditResponse::from_error(&err);
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.handle_request(&value),
            Err(_) => {
                let err = RequestError::MalformedRequest(
                    "The given JSON data could not be parsed.".to_string(),
                );
                warn!(error = %err, "request rejected");
                EditResponse::from_error(&err)
            }
        }
    }

    /// Handle a parsed request envelope.
    pub fn handle_request(&self, request: &Value) -> EditResponse {
        match self.process(request) {
            Ok(outcome) => EditResponse {
                status: 200,
                body: ResponseBody::Success {
                    image_base64: STANDARD.encode(&outcome.encoded),
                    image_format: outcome.artifact.format().to_string(),
                },
            },
            Err(err) => {
                if err.is_client_error() {
                    warn!(
                        status = err.status_code(),
                        kind = err.kind(),
                        error = %err,
                        "request rejected"
                    );
                } else {
                    error!(
                        status = err.status_code(),
                        kind = err.kind(),
                        error = %err,
                        "request failed"
                    );
                }
                EditResponse::from_error(&err)
            }
        }
    }

    /// Validate the envelope and run its action.
    pub fn process(&self, request: &Value) -> Result<EditOutcome, RequestError> {
        let fields = request
            .as_object()
            .ok_or_else(|| RequestError::MalformedRequest(IMPROPER_PAYLOAD.to_string()))?;

        let format = match fields.get("imageFormat") {
            None => {
                return Err(RequestError::MissingField(
                    "The JSON field: \"imageFormat\" for the Image Format is absent in this request"
                        .to_string(),
                ));
            }
            Some(Value::Null) => self.default_format,
            Some(declared) => {
                let name = declared
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| declared.to_string());
                ImageFormatTag::parse(&name).ok_or_else(|| {
                    OperationError::UnauthorizedImageFormat(format!(
                        "Image of type {} is unauthorized.",
                        name.to_lowercase()
                    ))
                })?
            }
        };

        let encoded = match fields.get("imageBase64URL") {
            None => {
                return Err(RequestError::MissingField(
                    "The JSON field: \"imageBase64URL\" for the encoded Base64 Image URL \
                     is absent in this request"
                        .to_string(),
                ));
            }
            Some(Value::String(data)) => decode_base64_image(data)?,
            Some(_) => {
                return Err(RequestError::InvalidImageData(
                    "The encoded Base64 Image URL provided in this request is invalid".to_string(),
                ));
            }
        };

        let action = fields
            .get("action")
            .ok_or_else(|| RequestError::MalformedRequest(IMPROPER_PAYLOAD.to_string()))?;

        self.apply(&encoded, format, action)
    }

    /// Run one action on encoded image bytes declared as `format`.
    pub fn apply(
        &self,
        bytes: &[u8],
        format: ImageFormatTag,
        action: &Value,
    ) -> Result<EditOutcome, RequestError> {
        let raster = self.backend.decode(bytes).map_err(|e| {
            warn!(error = %e, "inbound image did not decode");
            RequestError::InvalidImageData(
                "The encoded Base64 Image URL provided in this request is invalid".to_string(),
            )
        })?;

        let stage = self
            .staging
            .open()
            .map_err(|e| internal("opening request stage", e))?;
        let input = self.stage_input(&stage, ImageArtifact::new(raster, format))?;

        let command = validate(action)?;
        let output = dispatch(&self.backend, &input, &command)?;

        let encoded = self
            .backend
            .encode(output.image(), output.format())
            .map_err(|e| internal("encoding result", e))?;
        stage
            .write(&format!("output.{}", output.format().extension()), &encoded)
            .map_err(|e| internal("writing result to stage", e))?;

        info!(
            stage = %stage.id(),
            operation = command.operation().wire_name(),
            input = ?input.dimensions(),
            output = ?output.dimensions(),
            format = %output.format(),
            bytes = encoded.len(),
            "request completed"
        );
        Ok(EditOutcome {
            artifact: output,
            encoded,
        })
    }

    /// Persist the inbound raster in its declared format and read it back.
    fn stage_input(
        &self,
        stage: &RequestStage,
        artifact: ImageArtifact,
    ) -> Result<ImageArtifact, RequestError> {
        let format = artifact.format();
        let name = format!("input.{}", format.extension());
        let bytes = self
            .backend
            .encode(artifact.image(), format)
            .map_err(|e| internal("saving inbound image", e))?;
        stage
            .write(&name, &bytes)
            .map_err(|e| internal("writing inbound image to stage", e))?;
        let reread = stage
            .read(&name)
            .map_err(|e| internal("reading inbound image from stage", e))?;
        let image = self
            .backend
            .decode(&reread)
            .map_err(|e| internal("re-opening staged image", e))?;
        Ok(ImageArtifact::new(image, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{
        encode_as, encode_base64, envelope, gradient_rgba, png_bytes, square_on_background,
    };
    use image::GenericImageView;
    use serde_json::json;
    use tempfile::TempDir;

    fn service(tmp: &TempDir) -> EditorService<RustBackend> {
        EditorService::new(RustBackend::new(), StagingArea::new(tmp.path()))
    }

    fn decode_response(response: &EditResponse) -> image::DynamicImage {
        match &response.body {
            ResponseBody::Success { image_base64, .. } => {
                image::load_from_memory(&STANDARD.decode(image_base64).unwrap()).unwrap()
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    fn error_message(response: &EditResponse) -> &str {
        match &response.body {
            ResponseBody::Failure { error_message } => error_message,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    // =========================================================================
    // success paths
    // =========================================================================

    #[test]
    fn resize_by_percentage_round_trip() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(40, 20)),
            json!("png"),
            json!({"resize": {"resizeByPercentage": {"percentage": 50}}}),
        );
        let response = service(&tmp).handle_request(&request);

        assert_eq!(response.status, 200);
        assert_eq!(decode_response(&response).dimensions(), (20, 10));
        assert_eq!(response.to_json()["imageFormat"], "png");
    }

    #[test]
    fn null_format_means_default() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(8, 8)),
            Value::Null,
            json!({"filter": {"transformBlackNWhite": null}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 200);
        assert_eq!(response.to_json()["imageFormat"], "png");
    }

    #[test]
    fn conversion_reports_jpg() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(16, 16)),
            json!("PNG"),
            json!({"convert": {"convert": {"outputImageFormat": "jpeg"}}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 200, "{:?}", response.body);
        assert_eq!(response.to_json()["imageFormat"], "jpg");
        assert!(!decode_response(&response).color().has_alpha());
    }

    #[test]
    fn bmp_input_keeps_its_format() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &encode_as(&gradient_rgba(10, 6), image::ImageFormat::Bmp),
            json!("bmp"),
            json!({"resize": {"resize": {"width": 5, "height": 3}}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.to_json()["imageFormat"], "bmp");
        assert_eq!(decode_response(&response).dimensions(), (5, 3));
    }

    #[test]
    fn background_removal_keeps_the_subject() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&square_on_background(24, [250, 250, 250], [10, 120, 10])),
            json!("png"),
            json!({"bgRemove": {"bgRemove": null}}),
        );
        let response = service(&tmp).handle_request(&request);
        let rgba = decode_response(&response).to_rgba8();
        assert_eq!(rgba.get_pixel(1, 1)[3], 0);
        assert_eq!(rgba.get_pixel(12, 12)[3], 255);
    }

    #[test]
    fn data_url_prefix_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let data = format!(
            "data:image/png;base64,{}",
            encode_base64(&png_bytes(&gradient_rgba(6, 6)))
        );
        let request = json!({
            "imageBase64URL": data,
            "imageFormat": "png",
            "action": {"posModify": {"flip": {"direction": "horizontal"}}},
        });
        assert_eq!(service(&tmp).handle_request(&request).status, 200);
    }

    #[test]
    fn stage_directories_are_cleaned_up() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp);
        let ok = envelope(
            &png_bytes(&gradient_rgba(8, 8)),
            json!("png"),
            json!({"posModify": {"rotate": {"degrees": 90, "orientation": "clockwise"}}}),
        );
        let bad = envelope(
            &png_bytes(&gradient_rgba(8, 8)),
            json!("png"),
            json!({"crop": {"crop": {"x1": 0, "y1": 0, "x2": 50, "y2": 50}}}),
        );
        svc.handle_request(&ok);
        svc.handle_request(&bad);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    // =========================================================================
    // boundary errors
    // =========================================================================

    #[test]
    fn missing_format_field() {
        let tmp = TempDir::new().unwrap();
        let request = json!({
            "imageBase64URL": encode_base64(&png_bytes(&gradient_rgba(4, 4))),
            "action": {"filter": {"transformBlackNWhite": null}},
        });
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 400);
        assert!(error_message(&response).contains("imageFormat"));
    }

    #[test]
    fn missing_image_field() {
        let tmp = TempDir::new().unwrap();
        let request = json!({
            "imageFormat": "png",
            "action": {"filter": {"transformBlackNWhite": null}},
        });
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 400);
        assert!(error_message(&response).contains("imageBase64URL"));
    }

    #[test]
    fn garbage_image_data() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp);
        for data in ["***not base64***", "aGVsbG8gd29ybGQ="] {
            let request = json!({
                "imageBase64URL": data,
                "imageFormat": "png",
                "action": {"filter": {"transformBlackNWhite": null}},
            });
            let response = svc.handle_request(&request);
            assert_eq!(response.status, 400);
            assert_eq!(
                error_message(&response),
                "The encoded Base64 Image URL provided in this request is invalid"
            );
        }
    }

    #[test]
    fn unauthorized_declared_format() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(4, 4)),
            json!("GIF"),
            json!({"filter": {"transformBlackNWhite": null}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 400);
        assert_eq!(error_message(&response), "Image of type gif is unauthorized.");
    }

    #[test]
    fn missing_action() {
        let tmp = TempDir::new().unwrap();
        let request = json!({
            "imageBase64URL": encode_base64(&png_bytes(&gradient_rgba(4, 4))),
            "imageFormat": "png",
        });
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 400);
        assert_eq!(error_message(&response), IMPROPER_PAYLOAD);
    }

    #[test]
    fn unparseable_body() {
        let tmp = TempDir::new().unwrap();
        let response = service(&tmp).handle_json("{ not json");
        assert_eq!(response.status, 400);
        assert_eq!(error_message(&response), "The given JSON data could not be parsed.");
    }

    #[test]
    fn payload_limit() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp).with_max_payload_bytes(16);
        let response = svc.handle_json(&"x".repeat(17));
        assert_eq!(response.status, 413);
    }

    // =========================================================================
    // status classification
    // =========================================================================

    #[test]
    fn shape_and_value_errors_are_400() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp);
        let image = png_bytes(&gradient_rgba(10, 10));
        for action in [
            json!({"warp": {"warp": null}}),
            json!({"resize": {"resize": {"width": 10}}}),
            json!({"posModify": {"rotate": {"degrees": 400, "orientation": "clockwise"}}}),
            json!({"convert": {"convert": {"outputImageFormat": "png"}}}),
        ] {
            let response = svc.handle_request(&envelope(&image, json!("png"), action.clone()));
            assert_eq!(response.status, 400, "{action}");
        }
    }

    #[test]
    fn transformation_errors_are_400_with_operation_message() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(10, 10)),
            json!("png"),
            json!({"resize": {"resizeByPercentage": {"percentage": 1}}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 400);
        assert_eq!(
            error_message(&response),
            "An unknown error occurred while trying to resize the image."
        );
    }

    #[test]
    fn large_png_converts_to_ico() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(300, 300)),
            json!("png"),
            json!({"convert": {"convert": {"outputImageFormat": "ico"}}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 200, "{:?}", response.body);
        assert_eq!(response.to_json()["imageFormat"], "ico");
        assert_eq!(decode_response(&response).dimensions(), (256, 256));
    }

    #[test]
    fn large_ico_envelope_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let request = envelope(
            &png_bytes(&gradient_rgba(300, 300)),
            json!("ico"),
            json!({"posModify": {"flip": {"direction": "horizontal"}}}),
        );
        let response = service(&tmp).handle_request(&request);
        assert_eq!(response.status, 200, "{:?}", response.body);
        assert_eq!(response.to_json()["imageFormat"], "ico");
        let (width, height) = decode_response(&response).dimensions();
        assert!(width <= 256 && height <= 256);
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err = RequestError::Internal("disk on fire".to_string());
        let response = EditResponse::from_error(&err);
        assert_eq!(response.status, 500);
        assert_eq!(error_message(&response), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn response_body_serializes_with_wire_names() {
        let ok = ResponseBody::Success {
            image_base64: "AAAA".to_string(),
            image_format: "jpg".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"imageBase64URL": "AAAA", "imageFormat": "jpg"})
        );
        let err = ResponseBody::Failure {
            error_message: "nope".to_string(),
        };
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({"errorMessage": "nope"}));
    }

    #[test]
    fn to_json_matches_the_serialized_body() {
        let response = EditResponse {
            status: 200,
            body: ResponseBody::Success {
                image_base64: "AAAA".to_string(),
                image_format: "ico".to_string(),
            },
        };
        assert_eq!(
            response.to_json(),
            json!({"imageBase64URL": "AAAA", "imageFormat": "ico"})
        );
        let failed = EditResponse::from_error(&RequestError::MissingField("gone".to_string()));
        assert_eq!(failed.to_json(), json!({"errorMessage": "gone"}));
    }
}
