//! Pure calculation functions for fitting a source into a target.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are in logical pixels unless a function says otherwise.

use crate::resolve::round_half_up;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a source maps into the target rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Whole source visible; background may show on one axis.
    #[default]
    Contain,
    /// Target fully covered; overflow is cropped symmetrically.
    Cover,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" => Ok(FitMode::Contain),
            "cover" => Ok(FitMode::Cover),
            other => Err(format!("unknown fit mode '{other}' (expected contain or cover)")),
        }
    }
}

/// Destination rectangle for the scaled source. `x`/`y` go negative when the
/// source overflows the target (cover mode).
///
/// Lengths are `u64`: in cover mode a scaled side can be far longer than any
/// surface, and it is only clipped later by [`calculate_visible_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u64,
    pub height: u64,
}

/// Uniform scale factor for `mode`.
///
/// # Examples
/// ```
/// # use fitframe::imaging::{FitMode, calculate_scale};
/// assert_eq!(calculate_scale((100, 200), (200, 200), FitMode::Contain), 1.0);
/// assert_eq!(calculate_scale((100, 200), (200, 200), FitMode::Cover), 2.0);
/// ```
pub fn calculate_scale(source: (u32, u32), target: (u32, u32), mode: FitMode) -> f64 {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let sx = f64::from(tgt_w) / f64::from(src_w);
    let sy = f64::from(tgt_h) / f64::from(src_h);

    match mode {
        FitMode::Contain => sx.min(sy),
        FitMode::Cover => sx.max(sy),
    }
}

/// Scale and center the source inside the target.
///
/// Source dimensions must be non-zero. Scaled sides never drop below 1px.
pub fn calculate_placement(source: (u32, u32), target: (u32, u32), mode: FitMode) -> Placement {
    let scale = calculate_scale(source, target, mode);
    let (tgt_w, tgt_h) = target;

    let dw = round_half_up(f64::from(source.0) * scale).max(1.0);
    let dh = round_half_up(f64::from(source.1) * scale).max(1.0);
    let dx = round_half_up((f64::from(tgt_w) - dw) / 2.0);
    let dy = round_half_up((f64::from(tgt_h) - dh) / 2.0);

    Placement {
        x: dx as i64,
        y: dy as i64,
        width: dw as u64,
        height: dh as u64,
    }
}

/// Multiply a logical length by the pixel density, keeping it at least 1.
pub fn scale_by_density(length: u32, density: f64) -> u32 {
    round_half_up(f64::from(length) * density).max(1.0) as u32
}

/// Map a logical placement onto a physical backing buffer.
pub fn scale_placement(placement: Placement, density: f64) -> Placement {
    Placement {
        x: round_half_up(placement.x as f64 * density) as i64,
        y: round_half_up(placement.y as f64 * density) as i64,
        width: round_half_up(placement.width as f64 * density).max(1.0) as u64,
        height: round_half_up(placement.height as f64 * density).max(1.0) as u64,
    }
}

/// An axis-aligned pixel rectangle with a non-negative origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Whole source pixels that reach the surface, and where they land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRegion {
    /// Region of the source image to sample.
    pub source: Rect,
    /// Footprint of `source` at the placement's scale. It may start before
    /// or run past the surface; drawing clips it.
    pub dest: Placement,
}

/// How far a snapped span may exceed the visible window before it is
/// clamped to that window.
const MAX_SPAN_RATIO: u64 = 4;

/// One clipped axis: source start and length, destination start and length.
type AxisClip = (u32, u32, i64, u64);

/// Clip one axis of a placement to `[0, surface)`.
///
/// The visible window is widened to whole source pixels, and the destination
/// span is the exact footprint of those pixels, so the scale stays
/// `len / src_len` on every axis.
fn clip_axis(pos: i64, len: u64, surface: u32, src_len: u32) -> Option<AxisClip> {
    let start = pos.max(0);
    let end = pos.saturating_add_unsigned(len).min(i64::from(surface));
    if end <= start {
        return None;
    }

    let len_f = len as f64;
    let src_f = f64::from(src_len);
    let to_src = |d: i64| (d - pos) as f64 * src_f / len_f;
    let to_dest = |s: f64| pos.saturating_add(round_half_up(s * len_f / src_f) as i64);

    let src_end = to_src(end).ceil().clamp(1.0, src_f);
    let src_start = to_src(start).floor().clamp(0.0, src_end - 1.0);

    let visible = (end - start) as u64;
    let (mut dest_start, mut dest_end) = (to_dest(src_start), to_dest(src_end));
    if dest_end.abs_diff(dest_start) > visible.saturating_mul(MAX_SPAN_RATIO) {
        // One source pixel outgrows the surface; sample it straight into the window
        dest_start = start;
        dest_end = end;
    }
    let dest_end = dest_end.max(dest_start + 1);

    Some((
        src_start as u32,
        (src_end - src_start) as u32,
        dest_start,
        dest_end.abs_diff(dest_start),
    ))
}

/// Work out which source pixels are visible on a `surface` after placement.
///
/// Returns `None` when the placement falls entirely outside the surface.
/// Only the visible region needs resampling, which keeps cover mode from
/// allocating an enlarged copy of the whole source.
pub fn calculate_visible_region(
    source: (u32, u32),
    placement: Placement,
    surface: (u32, u32),
) -> Option<VisibleRegion> {
    let (sx, sw, dx, dw) = clip_axis(placement.x, placement.width, surface.0, source.0)?;
    let (sy, sh, dy, dh) = clip_axis(placement.y, placement.height, surface.1, source.1)?;

    Some(VisibleRegion {
        source: Rect {
            x: sx,
            y: sy,
            width: sw,
            height: sh,
        },
        dest: Placement {
            x: dx,
            y: dy,
            width: dw,
            height: dh,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_scale / calculate_placement
    // =========================================================================

    #[test]
    fn contain_portrait_into_square() {
        // scale = min(2, 1) = 1 → 100x200 centered horizontally
        let p = calculate_placement((100, 200), (200, 200), FitMode::Contain);
        assert_eq!(
            p,
            Placement {
                x: 50,
                y: 0,
                width: 100,
                height: 200
            }
        );
    }

    #[test]
    fn cover_portrait_into_square() {
        // scale = max(2, 1) = 2 → 200x400, cropped top and bottom
        let p = calculate_placement((100, 200), (200, 200), FitMode::Cover);
        assert_eq!(
            p,
            Placement {
                x: 0,
                y: -100,
                width: 200,
                height: 400
            }
        );
    }

    #[test]
    fn contain_landscape_into_portrait() {
        // 1600x900 into 1080x1920: scale = 0.675 → 1080x608, dy = 656
        let p = calculate_placement((1600, 900), (1080, 1920), FitMode::Contain);
        assert_eq!(p.width, 1080);
        assert_eq!(p.height, 608);
        assert_eq!(p.x, 0);
        assert_eq!(p.y, 656);
    }

    #[test]
    fn same_aspect_fills_exactly_in_both_modes() {
        for mode in [FitMode::Contain, FitMode::Cover] {
            let p = calculate_placement((800, 600), (400, 300), mode);
            assert_eq!(
                p,
                Placement {
                    x: 0,
                    y: 0,
                    width: 400,
                    height: 300
                }
            );
        }
    }

    #[test]
    fn odd_overflow_rounds_half_up() {
        // 3x1 cover into 2x2: scale 2 → 6x2, dx = round(-2) = -2
        let p = calculate_placement((3, 1), (2, 2), FitMode::Cover);
        assert_eq!((p.x, p.width), (-2, 6));
        // 1x1 contain into 2x3: scale 2 → 2x2, dy = round(0.5) = 1
        let p = calculate_placement((1, 1), (2, 3), FitMode::Contain);
        assert_eq!((p.y, p.height), (1, 2));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let p = calculate_placement((10_000, 1), (100, 100), FitMode::Contain);
        assert_eq!(p.width, 100);
        assert_eq!(p.height, 1);
    }

    #[test]
    fn fit_mode_parses_names() {
        assert_eq!("Cover".parse::<FitMode>().unwrap(), FitMode::Cover);
        assert_eq!("contain".parse::<FitMode>().unwrap(), FitMode::Contain);
        assert!("stretch".parse::<FitMode>().is_err());
    }

    // =========================================================================
    // density scaling
    // =========================================================================

    #[test]
    fn density_scales_placement_consistently() {
        let p = calculate_placement((100, 200), (200, 200), FitMode::Contain);
        let physical = scale_placement(p, 2.0);
        assert_eq!(
            physical,
            Placement {
                x: 100,
                y: 0,
                width: 200,
                height: 400
            }
        );
    }

    #[test]
    fn density_one_is_identity() {
        let p = calculate_placement((100, 200), (200, 200), FitMode::Cover);
        assert_eq!(scale_placement(p, 1.0), p);
        assert_eq!(scale_by_density(1920, 1.0), 1920);
    }

    // =========================================================================
    // calculate_visible_region
    // =========================================================================

    #[test]
    fn contain_region_is_whole_source() {
        let p = calculate_placement((100, 200), (200, 200), FitMode::Contain);
        let region = calculate_visible_region((100, 200), p, (200, 200)).unwrap();
        assert_eq!(
            region.source,
            Rect {
                x: 0,
                y: 0,
                width: 100,
                height: 200
            }
        );
        assert_eq!(region.dest, p);
    }

    #[test]
    fn cover_region_crops_source_center() {
        let p = calculate_placement((100, 200), (200, 200), FitMode::Cover);
        let region = calculate_visible_region((100, 200), p, (200, 200)).unwrap();
        // Visible rows 100..300 of the 400px placement → source rows 50..150
        assert_eq!(
            region.source,
            Rect {
                x: 0,
                y: 50,
                width: 100,
                height: 100
            }
        );
        assert_eq!(
            region.dest,
            Placement {
                x: 0,
                y: 0,
                width: 200,
                height: 200
            }
        );
    }

    #[test]
    fn small_cover_source_keeps_uniform_scale() {
        // 3x2 at scale 150 → 450x300, half a source pixel hidden on each side
        let p = calculate_placement((3, 2), (300, 300), FitMode::Cover);
        let region = calculate_visible_region((3, 2), p, (300, 300)).unwrap();
        assert_eq!(region.dest, p);
        assert_eq!(region.dest.width / u64::from(region.source.width), 150);
        assert_eq!(region.dest.height / u64::from(region.source.height), 150);
    }

    #[test]
    fn partial_pixel_crop_overhangs_surface() {
        // 5x2 at scale 6 → 30x12 at x = -9; visible x 0..12 is source 1.5..3.5
        let p = calculate_placement((5, 2), (12, 12), FitMode::Cover);
        let region = calculate_visible_region((5, 2), p, (12, 12)).unwrap();
        assert_eq!(
            region.source,
            Rect {
                x: 1,
                y: 0,
                width: 3,
                height: 2
            }
        );
        assert_eq!(
            region.dest,
            Placement {
                x: -3,
                y: 0,
                width: 18,
                height: 12
            }
        );
    }

    #[test]
    fn aligned_crop_maps_exactly() {
        // 8x2 at scale 20 → 160x40 at x = -60; visible is source columns 3..5
        let p = calculate_placement((8, 2), (40, 40), FitMode::Cover);
        let region = calculate_visible_region((8, 2), p, (40, 40)).unwrap();
        assert_eq!((region.source.x, region.source.width), (3, 2));
        assert_eq!((region.dest.x, region.dest.width), (0, 40));
    }

    #[test]
    fn region_outside_surface_is_none() {
        let p = Placement {
            x: 300,
            y: 0,
            width: 50,
            height: 50,
        };
        assert!(calculate_visible_region((50, 50), p, (200, 200)).is_none());
    }

    #[test]
    fn region_source_never_empty() {
        // 1px source stretched over a large overflowing placement
        let p = Placement {
            x: -500,
            y: -500,
            width: 1001,
            height: 1001,
        };
        let region = calculate_visible_region((1, 1), p, (10, 10)).unwrap();
        assert_eq!(region.source.width, 1);
        assert_eq!(region.source.height, 1);
        assert_eq!(region.source.x, 0);
        // The single pixel's footprint dwarfs the surface, so it is clamped
        assert_eq!((region.dest.x, region.dest.width), (0, 10));
    }

    #[test]
    fn scaled_side_beyond_u32_is_not_truncated() {
        let p = calculate_placement((1, 100), (100_000_000, 1), FitMode::Cover);
        assert_eq!(p.height, 10_000_000_000);
        assert_eq!(p.y, -4_999_999_999);

        let region = calculate_visible_region((1, 100), p, (100_000_000, 1)).unwrap();
        assert_eq!(
            region.source,
            Rect {
                x: 0,
                y: 49,
                width: 1,
                height: 1
            }
        );
        assert_eq!(
            region.dest,
            Placement {
                x: 0,
                y: 0,
                width: 100_000_000,
                height: 1
            }
        );
    }
}
