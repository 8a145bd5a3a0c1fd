//! Editor configuration module.
//!
//! Handles loading, validating, and merging `imagehacker.toml`. Stock defaults
//! are overridden by whatever the user file specifies; the file itself is
//! optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [request]
//! default_format = "png"        # Format assumed when imageFormat is null
//! max_payload_bytes = 16777216  # Largest accepted request body (0 = unlimited)
//!
//! [staging]
//! root = "/var/tmp/imagehacker" # Where per-request directories go (omit for system temp)
//!
//! [processing]
//! max_processes = 4             # Max parallel batch workers (omit for auto = CPU cores)
//! background_tolerance = 32     # Per-channel slack when removing backgrounds
//!
//! [logging]
//! level = "info"                # tracing filter directive
//! json = false                  # JSON lines instead of human-readable output
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::artifact::ImageFormatTag;
use crate::imaging::rust_backend::DEFAULT_BACKGROUND_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "imagehacker.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `imagehacker.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Request envelope handling.
    pub request: RequestConfig,
    /// Per-request scratch directories.
    pub staging: StagingConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if ImageFormatTag::parse(&self.request.default_format).is_none() {
            return Err(ConfigError::Validation(format!(
                "request.default_format must be one of bmp, ico, jpg, png (got {:?})",
                self.request.default_format
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Format assumed for a request whose `imageFormat` is null.
    pub default_format: String,
    /// Largest request body accepted, in bytes. Zero disables the check.
    pub max_payload_bytes: usize,
}

impl RequestConfig {
    /// The default format as a tag. Falls back to PNG for unvalidated values.
    pub fn default_format_tag(&self) -> ImageFormatTag {
        ImageFormatTag::parse(&self.default_format).unwrap_or(ImageFormatTag::Png)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_format: "png".to_string(),
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StagingConfig {
    /// Parent of the per-request directories. `None` = system temp dir.
    pub root: Option<PathBuf>,
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Per-channel distance from the corner colours still treated as
    /// background by background removal.
    pub background_tolerance: u8,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            background_tolerance: DEFAULT_BACKGROUND_TOLERANCE,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `imagehacker=debug`.
    pub level: String,
    /// Emit JSON lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EditorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// A missing file yields the stock defaults. User values are merged on top
/// of stock defaults, unknown keys are rejected, and the result is validated.
pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `imagehacker.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# ImageHacker Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Request envelope
# ---------------------------------------------------------------------------
[request]
# Format assumed when a request sends "imageFormat": null.
# One of: bmp, ico, jpg, png.
default_format = "png"

# Largest request body accepted, in bytes. 0 disables the limit.
max_payload_bytes = 16777216

# ---------------------------------------------------------------------------
# Staging
# ---------------------------------------------------------------------------
[staging]
# Each request gets its own directory under this root, removed when the
# request finishes. Omit to use the system temp directory.
# root = "/var/tmp/imagehacker"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for the batch command.
# Omit to use all CPU cores. Values above the core count are clamped down.
# max_processes = 4

# How far (per colour channel, 0-255) a border pixel may be from one of the
# four corner colours and still be removed as background.
background_tolerance = 32

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive. RUST_LOG overrides this when set.
level = "info"

# Emit JSON lines instead of human-readable output.
json = false
"##
}
