//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what to render) and the [`backend`](super::backend)
//! (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`JpegQuality`]: Lossy quality as a fraction in `(0, 1]`, default 0.92.
//! - [`OutputFormat`]: PNG or JPEG (with quality) for export.
//! - [`Background`]: Flat RGBA fill, parsed from CSS-style hex.
//! - [`RenderParams`]: Everything one composite needs.

use super::calculations::FitMode;
use crate::resolve::ResolvedDimensions;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParamsError {
    #[error("invalid color '{0}' (expected #rgb, #rrggbb or #rrggbbaa)")]
    InvalidColor(String),
    #[error("unknown output format '{0}' (expected png or jpeg)")]
    UnknownFormat(String),
    #[error("pixel density must be a finite number >= 1, got {0}")]
    InvalidDensity(f64),
}

/// JPEG quality as a fraction in `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JpegQuality(f64);

impl JpegQuality {
    pub const DEFAULT: f64 = 0.92;

    /// Zero, out-of-range or non-finite values fall back to the default.
    pub fn new(value: f64) -> Self {
        if value > 0.0 && value <= 1.0 {
            Self(value)
        } else {
            Self(Self::DEFAULT)
        }
    }

    /// Lenient parse from user text; garbage means "default".
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map_or_else(|_| Self::default(), Self::new)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Quality on the encoder's 1–100 scale.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Export format.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg { quality: JpegQuality },
}

impl OutputFormat {
    /// Parse a format name; the quality only applies to JPEG.
    pub fn parse(name: &str, quality: JpegQuality) -> Result<Self, ParamsError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg { quality }),
            other => Err(ParamsError::UnknownFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }

    /// Name used when the user gives no output path.
    pub fn default_file_name(self) -> String {
        format!("resized.{}", self.extension())
    }
}

/// Flat background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub [u8; 4]);

impl Background {
    pub const WHITE: Background = Background([255, 255, 255, 255]);

    pub fn rgba(self) -> [u8; 4] {
        self.0
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Background {
    type Err = ParamsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let hex = input.trim().trim_start_matches('#');
        let err = || ParamsError::InvalidColor(input.to_string());
        if !hex.is_ascii() {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|n| n * 17)
                .map_err(|_| err())
        };

        match hex.len() {
            3 => Ok(Background([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
            6 => Ok(Background([byte(0)?, byte(2)?, byte(4)?, 255])),
            8 => Ok(Background([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

/// Check a pixel density factor (device pixel ratio).
pub fn validate_density(density: f64) -> Result<f64, ParamsError> {
    if density.is_finite() && density >= 1.0 {
        Ok(density)
    } else {
        Err(ParamsError::InvalidDensity(density))
    }
}

/// Parameters for one composite.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Logical output size.
    pub size: ResolvedDimensions,
    pub mode: FitMode,
    pub background: Background,
    /// Backing-buffer multiplier; 1.0 renders at the logical size.
    pub density: f64,
}

impl RenderParams {
    pub fn new(size: ResolvedDimensions, mode: FitMode) -> Self {
        Self {
            size,
            mode,
            background: Background::default(),
            density: 1.0,
        }
    }
}
