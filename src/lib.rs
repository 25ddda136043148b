//! # Fitframe
//!
//! Fit one image onto a canvas of an exact size. The user picks a size (in
//! pixels, as an aspect ratio, or as a physical size at a DPI), a placement
//! mode, and a background; fitframe composites the source onto that canvas and
//! exports PNG or JPEG.
//!
//! # Architecture: Request → Dimensions → Surface → File
//!
//! ```text
//! 1. Resolve    SizeSpec       →  ResolvedDimensions   (pure, parsing + fallback)
//! 2. Plan       RenderRequest  →  RenderParams         (pixel ceiling, no allocation)
//! 3. Composite  SourceRaster   →  RenderedRaster       (background + fit + resample)
//! 4. Export     RenderedRaster →  bytes / file         (PNG, JPEG)
//! ```
//!
//! Steps 1 and 2 never touch pixels, so an oversize request is refused before
//! any buffer exists. Step 3 goes through the [`imaging::ImageBackend`] trait,
//! which lets tests swap in a recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Size requests in px / ratio / cm / m to integer pixels; the area ceiling |
//! | [`imaging`] | Placement math, compositing, encoding, and the backend trait |
//! | [`session`] | The working state: one source, one camera stream, one render |
//! | [`presets`] | Named size presets (A4, Full HD, 4K, square, story) |
//! | [`gallery`] | Capped, most-recent-first list of saved renders on disk |
//! | [`config`] | `fitframe.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Lenient Input By Default
//!
//! A size field that is empty or not a positive number falls back to its
//! default rather than failing, so a half-filled form still produces an image.
//! `--strict` (or `input.policy = "strict"`) turns that into an error.
//!
//! ## Crop Before Resample
//!
//! In cover mode the scaled source can be far larger than the canvas. Only the
//! part of the source that lands on the canvas is cropped and resampled, so
//! memory stays proportional to the output size.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and encoding use the `image` crate only. No
//! system libraries are needed and the binary is self-contained.

pub mod config;
pub mod gallery;
pub mod imaging;
pub mod output;
pub mod presets;
pub mod resolve;
pub mod session;
