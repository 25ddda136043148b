//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the pixel-level operations every backend
//! must support: identify, decode, composite, and encode. Everything above it
//! (size resolution, refusal checks, session state) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{OutputFormat, RenderParams};
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image file from disk.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Decode an in-memory encoded image, sniffing its format.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Fill, scale, and center `source` onto a fresh surface.
    ///
    /// The returned buffer is `params.size` scaled by `params.density`.
    /// Callers guarantee a non-empty source and an acceptable area.
    fn composite(
        &self,
        source: &DynamicImage,
        params: &RenderParams,
    ) -> Result<RgbaImage, BackendError>;

    /// Encode a rendered surface.
    fn encode(&self, surface: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, BackendError>;
}
