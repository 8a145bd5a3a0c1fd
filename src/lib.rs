//! # ImageHacker
//!
//! A JSON-driven image editing engine. A caller sends one encoded image and one
//! action; the engine validates the action against a fixed operation registry,
//! runs it, and answers with the edited image or a single error message.
//!
//! # Architecture: Validate, Dispatch, Operate
//!
//! Every request flows through the same pipeline:
//!
//! ```text
//! 1. Envelope   JSON body       →  image bytes + format + action
//! 2. Validate   action          →  CommandDescriptor          (schema + shape checks)
//! 3. Dispatch   descriptor      →  one operation              (exhaustive match)
//! 4. Operate    ImageArtifact   →  ImageArtifact              (via ImageBackend)
//! 5. Respond    result / error  →  { imageBase64URL, imageFormat } | { errorMessage }
//! ```
//!
//! An action has three nested names: category, operation, parameters:
//!
//! ```json
//! { "posModify": { "rotate": { "degrees": 90, "orientation": "clockwise" } } }
//! ```
//!
//! The validator only checks shape against the registry. Parameter *values*
//! are checked by the operation that consumes them, so each operation owns its
//! own error messages.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`schema`] | Static registry of categories, operations and their parameter names |
//! | [`command`] | Action validator producing a [`command::CommandDescriptor`] |
//! | [`dispatch`] | Routes a descriptor to exactly one operation |
//! | [`imaging`] | The operations themselves, over a swappable [`imaging::ImageBackend`] |
//! | [`artifact`] | Decoded image plus its format tag |
//! | [`error`] | Flat taxonomy of operation failures with HTTP-style status codes |
//! | [`service`] | Request envelope handling: decode, stage, run, encode, respond |
//! | [`staging`] | Per-request scratch directories, removed when the request ends |
//! | [`batch`] | Parallel runner for a directory of request files |
//! | [`config`] | `imagehacker.toml` loading, merging over stock defaults, validation |
//! | [`logging`] | Tracing subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Operation Set
//!
//! Categories and operations are enums, not strings. The registry maps wire
//! names onto them once, and dispatch is an exhaustive `match`: adding an
//! operation without routing it is a compile error.
//!
//! ## One Error Type for Every Failure
//!
//! [`error::OperationError`] is a flat enum. Each variant carries the message
//! the caller sees and knows its own status code, so the response layer never
//! inspects message text.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for codecs and resampling and
//! `imageproc` for arbitrary-angle rotation. No system libraries are needed.
//!
//! ## Isolated Requests
//!
//! Each request gets its own staging directory named by a fresh UUID and its
//! own artifacts. Nothing is shared between requests except the stateless
//! backend, so [`batch`] can run them on a rayon pool without locking.

pub mod artifact;
pub mod batch;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod schema;
pub mod service;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_helpers;
