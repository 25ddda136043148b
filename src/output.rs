//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! Loaded 4032×3024
//!     Source: photo.jpg
//! Rendered 1920×1080px (contain)
//!     Buffer: 3840×2160 (density 2)
//!     Output: resized.png (482113 bytes)
//!     Gallery: 3f2a9c01b7de
//! ```
//!
//! ## Resolve
//!
//! ```text
//! 2480×3508
//!     Request: cm 21 × 29.7 @ 300 dpi
//!     Source: 4032×3024
//!     Placement: 0,868 2480×1772 (contain)
//! ```
//!
//! ## Gallery
//!
//! ```text
//! Gallery (2 of 30)
//! 001 1920×1080 3f2a9c01b7de
//! 002 1080×1080 a0c4e1f29b33
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::gallery::GalleryEntry;
use crate::imaging::{Dimensions, FitMode, Placement, RenderError, RenderedRaster, SourceRaster};
use crate::presets::Preset;
use crate::resolve::{ResolvedDimensions, SizeSpec};
use std::fmt::Display;
use std::path::Path;

/// Shown when a render is refused for exceeding the pixel ceiling.
pub const TOO_LARGE_MESSAGE: &str = "Requested size too large. Choose smaller dimensions.";

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn size(width: impl Display, height: impl Display) -> String {
    format!("{width}×{height}")
}

/// Human-readable form of a size request as it was typed.
fn describe_request(spec: &SizeSpec) -> String {
    let or_default = |s: &str| match s.trim() {
        "" => "(default)".to_string(),
        value => value.to_string(),
    };
    let (a, b) = (or_default(&spec.value_a), or_default(&spec.value_b));
    match spec.unit.trim().to_ascii_lowercase().as_str() {
        "cm" | "m" => format!(
            "{} {a} × {b} @ {} dpi",
            spec.unit.trim(),
            or_default(&spec.dpi)
        ),
        "ratio" => format!("ratio {a}:{b}"),
        unit => format!("{unit} {a} × {b}"),
    }
}

// ============================================================================
// Status messages
// ============================================================================

/// User-facing message for a refused or failed render.
pub fn format_refusal(err: &RenderError) -> String {
    if err.is_too_large() {
        TOO_LARGE_MESSAGE.to_string()
    } else {
        err.to_string()
    }
}

/// Format the status after a source has been acquired.
pub fn format_loaded(source: &SourceRaster, origin: &str) -> Vec<String> {
    vec![
        format!("Loaded {}", size(source.width(), source.height())),
        format!("    Source: {origin}"),
    ]
}

pub fn print_loaded(source: &SourceRaster, origin: &str) {
    for line in format_loaded(source, origin) {
        println!("{}", line);
    }
}

// ============================================================================
// Render
// ============================================================================

/// Format the result of a render and its export.
///
/// The buffer line only appears when density scaled the backing buffer.
pub fn format_render_output(
    rendered: &RenderedRaster,
    output: &Path,
    bytes: usize,
    gallery_id: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![format!("Rendered {}px ({})", rendered.logical, rendered.mode)];

    let (pw, ph) = rendered.physical_size();
    if (pw, ph) != (rendered.logical.width, rendered.logical.height) {
        lines.push(format!(
            "    Buffer: {} (density {})",
            size(pw, ph),
            rendered.density
        ));
    }
    lines.push(format!("    Output: {} ({} bytes)", output.display(), bytes));
    if let Some(id) = gallery_id {
        lines.push(format!("    Gallery: {id}"));
    }
    lines
}

pub fn print_render_output(
    rendered: &RenderedRaster,
    output: &Path,
    bytes: usize,
    gallery_id: Option<&str>,
) {
    for line in format_render_output(rendered, output, bytes, gallery_id) {
        println!("{}", line);
    }
}

// ============================================================================
// Resolve
// ============================================================================

/// Format a resolved size, optionally with where a source would be placed.
pub fn format_resolve_output(
    spec: &SizeSpec,
    dims: ResolvedDimensions,
    preview: Option<(Dimensions, Placement, FitMode)>,
) -> Vec<String> {
    let mut lines = vec![
        dims.to_string(),
        format!("    Request: {}", describe_request(spec)),
    ];
    if let Some((source, p, mode)) = preview {
        lines.push(format!("    Source: {}", size(source.width, source.height)));
        lines.push(format!(
            "    Placement: {},{} {} ({})",
            p.x,
            p.y,
            size(p.width, p.height),
            mode
        ));
    }
    lines
}

pub fn print_resolve_output(
    spec: &SizeSpec,
    dims: ResolvedDimensions,
    preview: Option<(Dimensions, Placement, FitMode)>,
) {
    for line in format_resolve_output(spec, dims, preview) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

/// One line per preset, with what it requests.
pub fn format_presets() -> Vec<String> {
    Preset::ALL
        .iter()
        .enumerate()
        .map(|(i, preset)| {
            let (unit, a, b) = preset.values();
            let detail = if a.is_empty() && b.is_empty() {
                format!("{unit} (defaults)")
            } else {
                format!("{a} × {b} {unit}")
            };
            format!("{} {:<8} {}", format_index(i + 1), preset.name(), detail)
        })
        .collect()
}

pub fn print_presets() {
    for line in format_presets() {
        println!("{}", line);
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format the saved renders, most recent first.
pub fn format_gallery_list(entries: &[GalleryEntry], capacity: usize) -> Vec<String> {
    if entries.is_empty() {
        return vec!["Gallery is empty".to_string()];
    }
    let mut lines = vec![format!("Gallery ({} of {})", entries.len(), capacity)];
    lines.extend(entries.iter().enumerate().map(|(i, e)| {
        format!("{} {} {}", format_index(i + 1), size(e.width, e.height), e.id)
    }));
    lines
}

pub fn print_gallery_list(entries: &[GalleryEntry], capacity: usize) {
    for line in format_gallery_list(entries, capacity) {
        println!("{}", line);
    }
}
