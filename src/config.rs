//! Configuration module.
//!
//! Handles loading, validating, and merging `fitframe.toml`. Configuration is
//! layered: stock defaults are overridden by the user's config file, which is
//! in turn overridden by command-line flags. Every layer is a sparse TOML
//! table merged with [`merge_toml`] before the result is deserialized once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [size]
//! unit = "px"               # px | ratio | cm | m
//! value_a = "1920"          # width (or ratio numerator)
//! value_b = "1080"          # height (or ratio denominator)
//! dpi = "300"               # only used by cm / m
//!
//! [input]
//! policy = "lenient"        # lenient | strict
//!
//! [render]
//! mode = "contain"          # contain | cover
//! background = "#ffffff"
//! density = 1.0             # backing-buffer multiplier (>= 1)
//!
//! [output]
//! format = "png"            # png | jpeg
//! jpeg_quality = 0.92       # (0.0, 1.0]; anything else means 0.92
//!
//! [limits]
//! max_pixels = 100000000    # refuse larger renders
//!
//! [gallery]
//! capacity = 30             # saved renders kept, newest first
//! ```
//!
//! Size values are kept as the strings the user wrote (numbers are accepted
//! too) because their parsing and fallback policy belong to
//! [`resolve`](crate::resolve). Unknown keys are rejected to catch typos early.

use crate::gallery::DEFAULT_CAPACITY;
use crate::imaging::{
    Background, FitMode, JpegQuality, OutputFormat, RenderRequest, validate_density,
};
use crate::resolve::{DEFAULT_MAX_PIXELS, ParsePolicy, SizeSpec};
use crate::session::SessionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "fitframe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration. All fields have defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default size request.
    pub size: SizeSpec,
    /// Parsing policy for size values.
    pub input: InputConfig,
    /// Compositing settings.
    pub render: RenderConfig,
    /// Export encoding.
    pub output: OutputConfig,
    /// Safety ceilings.
    pub limits: LimitsConfig,
    /// Saved-render list.
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub policy: ParsePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub mode: FitMode,
    /// CSS-style hex color.
    pub background: String,
    /// Backing-buffer multiplier, like a display's device pixel ratio.
    pub density: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: FitMode::Contain,
            background: "#ffffff".to_string(),
            density: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// `png` or `jpeg`.
    pub format: String,
    /// JPEG quality as a fraction. Zero or out-of-range values export at 0.92.
    pub jpeg_quality: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            jpeg_quality: JpegQuality::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest `width × height` a render may have.
    pub max_pixels: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub capacity: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| ConfigError::Validation(msg);

        self.background()
            .map_err(|e| invalid(format!("render.background: {e}")))?;
        validate_density(self.render.density)
            .map_err(|e| invalid(format!("render.density: {e}")))?;
        self.output_format()
            .map_err(|e| invalid(format!("output.format: {e}")))?;
        if self.limits.max_pixels == 0 {
            return Err(invalid("limits.max_pixels must be non-zero".into()));
        }
        if self.gallery.capacity == 0 {
            return Err(invalid("gallery.capacity must be non-zero".into()));
        }
        Ok(())
    }

    pub fn background(&self) -> Result<Background, crate::imaging::ParamsError> {
        self.render.background.parse()
    }

    pub fn output_format(&self) -> Result<OutputFormat, crate::imaging::ParamsError> {
        OutputFormat::parse(&self.output.format, JpegQuality::new(self.output.jpeg_quality))
    }

    /// The render request described by this config.
    pub fn render_request(&self) -> Result<RenderRequest, ConfigError> {
        Ok(RenderRequest {
            size: self.size.clone(),
            mode: self.render.mode,
            background: self
                .background()
                .map_err(|e| ConfigError::Validation(e.to_string()))?,
            density: self.render.density,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            policy: self.input.policy,
            max_pixels: self.limits.max_pixels,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Apply overlays in order on top of `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` (if present) over the stock defaults,
/// then apply `cli` on top.
///
/// An explicitly requested file that does not exist is an error; the
/// default file is optional.
pub fn load_config(
    path: Option<&Path>,
    cli: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => Some(load_raw_config(p)?.ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file {} not found", p.display()),
            ))
        })?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    if file.is_some() {
        let source = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        log::debug!("loaded config from {}", source.display());
    }
    resolve_config(stock_defaults_value(), file.into_iter().chain(cli))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fitframe configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# fitframe reads ./fitframe.toml, or the file given with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Default output size
# ---------------------------------------------------------------------------
[size]
# px    -> value_a x value_b pixels
# ratio -> value_a:value_b, always 1920 tall
# cm/m  -> physical size, converted at the given dpi
unit = "px"
value_a = "1920"
value_b = "1080"
dpi = "300"

# ---------------------------------------------------------------------------
# Input handling
# ---------------------------------------------------------------------------
[input]
# lenient: malformed size values silently use their defaults.
# strict:  malformed size values are an error.
policy = "lenient"

# ---------------------------------------------------------------------------
# Compositing
# ---------------------------------------------------------------------------
[render]
# contain: whole image visible, background fills the rest.
# cover:   output fully covered, overflow cropped evenly.
mode = "contain"
background = "#ffffff"
# Backing-buffer multiplier for high-density output (2.0 = twice the pixels).
density = 1.0

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[output]
format = "png"
# JPEG quality, above 0.0 (worst) up to 1.0 (best). Ignored for PNG.
# Zero or anything out of range exports at 0.92.
jpeg_quality = 0.92

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Renders larger than this many pixels are refused before allocation.
max_pixels = 100000000

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Saved renders kept, newest first. Older ones are dropped.
capacity = 30
"##
}
