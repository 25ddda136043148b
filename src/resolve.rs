//! Dimension resolution: turning a user's size request into pixels.
//!
//! A [`SizeSpec`] carries the raw strings exactly as the user typed them
//! (unit, two values, DPI). [`resolve`] parses them and produces
//! [`ResolvedDimensions`]. Numeric parsing and the fallback policy live here,
//! not in the CLI, so every input surface (flags, presets, config) behaves the
//! same way.
//!
//! ## Units
//!
//! | Unit | Width | Height | Defaults |
//! |---|---|---|---|
//! | `px` | `round(a)` | `round(b)` | 1920 × 1080 |
//! | `ratio` | `round(1920 × a / b)` | `1920` | 16 : 9 |
//! | `cm` | `round(a × dpi / 2.54)` | `round(b × dpi / 2.54)` | 21 × 29.7 (A4), 300 DPI |
//! | `m` | as `cm` after × 100 | as `cm` after × 100 | 21 × 29.7, 300 DPI |
//!
//! An unrecognized unit resolves to 1920 × 1080.
//!
//! ## Leniency
//!
//! Under [`ParsePolicy::Lenient`] a field that is empty, non-numeric,
//! non-finite, zero, or negative is replaced by its default and resolution
//! never fails. [`ParsePolicy::Strict`] reports the first bad field instead.
//!
//! The pixel-area ceiling is a separate step ([`check_area`]) so callers can
//! refuse a render before allocating anything.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed output height (and width base) for ratio mode.
pub const RATIO_BASE: f64 = 1920.0;

/// Default pixel-area ceiling: 10,000 × 10,000.
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

const CM_PER_INCH: f64 = 2.54;
const CM_PER_METER: f64 = 100.0;

const DEFAULT_PX: (f64, f64) = (1920.0, 1080.0);
const DEFAULT_RATIO: (f64, f64) = (16.0, 9.0);
const DEFAULT_CM: (f64, f64) = (21.0, 29.7);
const DEFAULT_DPI: f64 = 300.0;

#[derive(Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("unknown unit '{0}' (expected px, ratio, cm or m)")]
    UnknownUnit(String),
    #[error("invalid {field}: '{value}' is not a positive number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Requested size too large ({width}×{height} exceeds {max} pixels)")]
    SizeTooLarge { width: u32, height: u32, max: u64 },
}

/// Unit system for a size request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[serde(rename = "px")]
    Pixels,
    Ratio,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "m")]
    Meters,
}

impl Unit {
    /// Short name, as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Pixels => "px",
            Unit::Ratio => "ratio",
            Unit::Centimeters => "cm",
            Unit::Meters => "m",
        }
    }

    /// Parse a unit name, case-insensitive. Returns `None` if unrecognized.
    pub fn parse(raw: &str) -> Option<Unit> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "px" | "pixels" => Some(Unit::Pixels),
            "ratio" => Some(Unit::Ratio),
            "cm" | "centimeters" => Some(Unit::Centimeters),
            "m" | "meters" => Some(Unit::Meters),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s).ok_or_else(|| ResolveError::UnknownUnit(s.to_string()))
    }
}

/// How malformed numeric input is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Substitute the documented default and carry on.
    #[default]
    Lenient,
    /// Refuse with a [`ResolveError`].
    Strict,
}

/// A size request as raw user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeSpec {
    pub unit: String,
    #[serde(deserialize_with = "text_or_number")]
    pub value_a: String,
    #[serde(deserialize_with = "text_or_number")]
    pub value_b: String,
    #[serde(deserialize_with = "text_or_number")]
    pub dpi: String,
}

/// Accept `21`, `29.7` or `"21"` for a size field and keep it as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a number or text, got {}",
            other.type_str()
        ))),
    }
}

impl SizeSpec {
    pub fn new(
        unit: impl Into<String>,
        value_a: impl Into<String>,
        value_b: impl Into<String>,
        dpi: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            value_a: value_a.into(),
            value_b: value_b.into(),
            dpi: dpi.into(),
        }
    }
}

impl Default for SizeSpec {
    fn default() -> Self {
        Self::new("px", "1920", "1080", "300")
    }
}

/// Final integer pixel size. Both sides are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDimensions {
    pub width: u32,
    pub height: u32,
}

impl ResolvedDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for ResolvedDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Round half up, the way a canvas coordinate rounds (`-2.5 → -2`).
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Convert a positive float to a pixel count of at least 1.
fn to_px(x: f64) -> u32 {
    round_half_up(x).clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Parse one numeric field. `None` means "use the default".
fn parse_field(
    field: &'static str,
    raw: &str,
    policy: ParsePolicy,
) -> Result<Option<f64>, ResolveError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
        _ if trimmed.is_empty() && policy == ParsePolicy::Lenient => Ok(None),
        _ => match policy {
            ParsePolicy::Lenient => {
                log::debug!("{field}: '{raw}' is not a positive number, using default");
                Ok(None)
            }
            ParsePolicy::Strict => Err(ResolveError::InvalidNumber {
                field,
                value: raw.to_string(),
            }),
        },
    }
}

fn field_or(
    field: &'static str,
    raw: &str,
    default: f64,
    policy: ParsePolicy,
) -> Result<f64, ResolveError> {
    Ok(parse_field(field, raw, policy)?.unwrap_or(default))
}

/// Resolve a size request to pixels.
///
/// Under [`ParsePolicy::Lenient`] this never returns an error.
///
/// ```
/// use fitframe::resolve::{resolve, ParsePolicy, ResolvedDimensions, SizeSpec};
/// let a4 = SizeSpec::new("cm", "21", "29.7", "300");
/// assert_eq!(
///     resolve(&a4, ParsePolicy::Lenient).unwrap(),
///     ResolvedDimensions::new(2480, 3508)
/// );
/// ```
pub fn resolve(spec: &SizeSpec, policy: ParsePolicy) -> Result<ResolvedDimensions, ResolveError> {
    let unit = match Unit::parse(&spec.unit) {
        Some(unit) => unit,
        None if policy == ParsePolicy::Strict => {
            return Err(ResolveError::UnknownUnit(spec.unit.clone()));
        }
        None => {
            log::debug!("unknown unit '{}', using 1920×1080", spec.unit);
            return Ok(ResolvedDimensions::new(1920, 1080));
        }
    };

    let dims = match unit {
        Unit::Pixels => {
            let w = field_or("width", &spec.value_a, DEFAULT_PX.0, policy)?;
            let h = field_or("height", &spec.value_b, DEFAULT_PX.1, policy)?;
            ResolvedDimensions::new(to_px(w), to_px(h))
        }
        Unit::Ratio => {
            let a = field_or("ratio width", &spec.value_a, DEFAULT_RATIO.0, policy)?;
            let b = field_or("ratio height", &spec.value_b, DEFAULT_RATIO.1, policy)?;
            ResolvedDimensions::new(to_px(RATIO_BASE * (a / b)), to_px(RATIO_BASE))
        }
        Unit::Centimeters | Unit::Meters => {
            let factor = if unit == Unit::Meters { CM_PER_METER } else { 1.0 };
            let dpi = field_or("dpi", &spec.dpi, DEFAULT_DPI, policy)?;
            let cm_w = field_or("width", &spec.value_a, DEFAULT_CM.0, policy)? * factor;
            let cm_h = field_or("height", &spec.value_b, DEFAULT_CM.1, policy)? * factor;
            ResolvedDimensions::new(
                to_px(cm_w * dpi / CM_PER_INCH),
                to_px(cm_h * dpi / CM_PER_INCH),
            )
        }
    };

    Ok(dims)
}

/// Refuse dimensions whose area exceeds `max_pixels`.
pub fn check_area(dims: ResolvedDimensions, max_pixels: u64) -> Result<(), ResolveError> {
    if dims.area() > max_pixels {
        return Err(ResolveError::SizeTooLarge {
            width: dims.width,
            height: dims.height,
            max: max_pixels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(unit: &str, a: &str, b: &str, dpi: &str) -> ResolvedDimensions {
        resolve(&SizeSpec::new(unit, a, b, dpi), ParsePolicy::Lenient).unwrap()
    }

    // =========================================================================
    // Units
    // =========================================================================

    #[test]
    fn pixels_pass_through() {
        assert_eq!(lenient("px", "1920", "1080", ""), ResolvedDimensions::new(1920, 1080));
    }

    #[test]
    fn pixels_round_fractional_values() {
        assert_eq!(lenient("px", "99.5", "100.4", ""), ResolvedDimensions::new(100, 100));
    }

    #[test]
    fn centimeters_a4_at_300_dpi() {
        assert_eq!(lenient("cm", "21", "29.7", "300"), ResolvedDimensions::new(2480, 3508));
    }

    #[test]
    fn ratio_sixteen_by_nine() {
        assert_eq!(lenient("ratio", "16", "9", ""), ResolvedDimensions::new(3413, 1920));
    }

    #[test]
    fn ratio_height_is_always_base() {
        assert_eq!(lenient("ratio", "1", "2", ""), ResolvedDimensions::new(960, 1920));
    }

    #[test]
    fn meters_square_at_96_dpi() {
        assert_eq!(lenient("m", "1", "1", "96"), ResolvedDimensions::new(3780, 3780));
    }

    #[test]
    fn unit_names_are_case_insensitive() {
        assert_eq!(Unit::parse("PX"), Some(Unit::Pixels));
        assert_eq!(Unit::parse(" Centimeters "), Some(Unit::Centimeters));
        assert_eq!(Unit::parse("meters"), Some(Unit::Meters));
        assert_eq!(Unit::parse("inch"), None);
    }

    // =========================================================================
    // Fallbacks
    // =========================================================================

    #[test]
    fn malformed_pixel_width_falls_back() {
        let dims = lenient("px", "abc", "1080", "");
        assert_eq!(dims.width, 1920);
        assert_eq!(dims.height, 1080);
    }

    #[test]
    fn empty_pixel_fields_fall_back() {
        assert_eq!(lenient("px", "", "  ", ""), ResolvedDimensions::new(1920, 1080));
    }

    #[test]
    fn zero_ratio_denominator_falls_back() {
        assert_eq!(lenient("ratio", "16", "0", ""), ResolvedDimensions::new(3413, 1920));
    }

    #[test]
    fn invalid_dpi_falls_back_to_300() {
        assert_eq!(lenient("cm", "21", "29.7", "lots"), ResolvedDimensions::new(2480, 3508));
    }

    #[test]
    fn centimeter_defaults_are_a4() {
        assert_eq!(lenient("cm", "", "", ""), ResolvedDimensions::new(2480, 3508));
    }

    #[test]
    fn unknown_unit_falls_back() {
        assert_eq!(lenient("furlongs", "1", "1", ""), ResolvedDimensions::new(1920, 1080));
    }

    #[test]
    fn negative_and_infinite_values_fall_back() {
        assert_eq!(lenient("px", "-50", "inf", ""), ResolvedDimensions::new(1920, 1080));
    }

    #[test]
    fn tiny_values_clamp_to_one() {
        assert_eq!(lenient("px", "0.2", "0.4", ""), ResolvedDimensions::new(1, 1));
        assert_eq!(lenient("cm", "0.001", "0.001", "1"), ResolvedDimensions::new(1, 1));
    }

    #[test]
    fn every_unit_resolves_to_at_least_one_pixel() {
        let inputs = ["", "0", "-1", "0.0001", "x", "1e-9", "3"];
        for unit in ["px", "ratio", "cm", "m", "???"] {
            for a in inputs {
                for b in inputs {
                    let dims = lenient(unit, a, b, "0.5");
                    assert!(dims.width >= 1 && dims.height >= 1, "{unit} {a} {b}");
                }
            }
        }
    }

    // =========================================================================
    // Strict policy
    // =========================================================================

    #[test]
    fn strict_rejects_malformed_value() {
        let err = resolve(&SizeSpec::new("px", "12a", "100", ""), ParsePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidNumber {
                field: "width",
                value: "12a".into()
            }
        );
    }

    #[test]
    fn strict_rejects_unknown_unit() {
        let err = resolve(&SizeSpec::new("yd", "1", "1", ""), ParsePolicy::Strict).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownUnit(u) if u == "yd"));
    }

    #[test]
    fn strict_rejects_empty_field() {
        let result = resolve(&SizeSpec::new("px", "", "100", ""), ParsePolicy::Strict);
        assert!(result.is_err());
    }

    #[test]
    fn strict_accepts_valid_input() {
        let dims = resolve(&SizeSpec::new("m", "1", "1", "96"), ParsePolicy::Strict).unwrap();
        assert_eq!(dims, ResolvedDimensions::new(3780, 3780));
    }

    // =========================================================================
    // Area ceiling
    // =========================================================================

    #[test]
    fn area_at_limit_is_accepted() {
        assert!(check_area(ResolvedDimensions::new(10_000, 10_000), DEFAULT_MAX_PIXELS).is_ok());
    }

    #[test]
    fn area_over_limit_is_rejected() {
        let err = check_area(ResolvedDimensions::new(10_001, 10_000), DEFAULT_MAX_PIXELS)
            .unwrap_err();
        assert!(matches!(err, ResolveError::SizeTooLarge { width: 10_001, .. }));
    }

    #[test]
    fn area_uses_wide_arithmetic() {
        let dims = ResolvedDimensions::new(u32::MAX, u32::MAX);
        assert!(check_area(dims, DEFAULT_MAX_PIXELS).is_err());
    }

    #[test]
    fn size_fields_reject_non_scalar_values() {
        assert!(toml::from_str::<SizeSpec>("value_a = true").is_err());
        assert!(toml::from_str::<SizeSpec>("dpi = [300]").is_err());
        let spec: SizeSpec = toml::from_str("value_b = -4").unwrap();
        assert_eq!(spec.value_b, "-4");
    }

    #[test]
    fn round_half_up_matches_canvas_rounding() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-100.0), -100.0);
    }
}
