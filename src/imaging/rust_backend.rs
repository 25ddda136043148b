//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Background fill | `RgbaImage::from_pixel` |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Composite | `image::imageops::overlay` (alpha blended) |
//! | Encode | `PngEncoder`, `JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_placement, calculate_visible_region, scale_placement};
use super::params::{OutputFormat, RenderParams};
use super::raster::physical_dimensions;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Resampling filter for every scale operation. Interpolated, never nearest.
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(what: impl std::fmt::Display, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {what}: {e}"))
}

fn encode_failed(format: &str, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("{format} encode failed: {e}"))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_failed(path.display(), e))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| decode_failed("input bytes", e))
    }

    fn composite(
        &self,
        source: &DynamicImage,
        params: &RenderParams,
    ) -> Result<RgbaImage, BackendError> {
        let src_dims = (source.width(), source.height());
        if src_dims.0 == 0 || src_dims.1 == 0 {
            return Err(BackendError::ProcessingFailed("empty source image".into()));
        }

        let physical = physical_dimensions(params.size, params.density);
        let mut surface = RgbaImage::from_pixel(
            physical.width,
            physical.height,
            Rgba(params.background.rgba()),
        );

        // Placement is computed in logical units, then mapped to the buffer
        let logical = calculate_placement(
            src_dims,
            (params.size.width, params.size.height),
            params.mode,
        );
        let placement = scale_placement(logical, params.density);

        let Some(region) =
            calculate_visible_region(src_dims, placement, (physical.width, physical.height))
        else {
            return Ok(surface);
        };

        let cropped = source.crop_imm(
            region.source.x,
            region.source.y,
            region.source.width,
            region.source.height,
        );
        let span = |len: u64| {
            u32::try_from(len).map_err(|_| {
                BackendError::ProcessingFailed(format!("scaled span of {len}px is too large"))
            })
        };
        let (span_w, span_h) = (span(region.dest.width)?, span(region.dest.height)?);
        let scaled = if (cropped.width(), cropped.height()) == (span_w, span_h) {
            cropped.to_rgba8()
        } else {
            cropped
                .resize_exact(span_w, span_h, RESAMPLE_FILTER)
                .to_rgba8()
        };

        // The span may overhang the surface by part of a source pixel
        imageops::overlay(&mut surface, &scaled, region.dest.x, region.dest.y);
        Ok(surface)
    }

    fn encode(&self, surface: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, BackendError> {
        let mut buf = Cursor::new(Vec::new());
        let (width, height) = surface.dimensions();

        match format {
            OutputFormat::Png => PngEncoder::new(&mut buf)
                .write_image(surface.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| encode_failed("PNG", e))?,
            OutputFormat::Jpeg { quality } => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(surface.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, quality.percent())
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| encode_failed("JPEG", e))?
            }
        }

        Ok(buf.into_inner())
    }
}
