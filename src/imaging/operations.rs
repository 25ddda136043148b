//! High-level image operations.
//!
//! These functions combine size resolution, refusal checks, and backend
//! execution. They take a request, work out the parameters, and call the
//! backend only once every precondition holds.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{FitMode, Placement, calculate_placement};
use super::params::{Background, OutputFormat, ParamsError, RenderParams, validate_density};
use super::raster::{RenderedRaster, SourceRaster, physical_dimensions};
use crate::resolve::{ParsePolicy, ResolveError, SizeSpec, check_area, resolve};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Source image not ready")]
    SourceNotReady,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RenderError {
    /// True when the render was refused for exceeding the pixel ceiling.
    pub fn is_too_large(&self) -> bool {
        matches!(self, RenderError::Resolve(ResolveError::SizeTooLarge { .. }))
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Everything the user chose for one render, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub size: SizeSpec,
    pub mode: FitMode,
    pub background: Background,
    pub density: f64,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            size: SizeSpec::default(),
            mode: FitMode::default(),
            background: Background::default(),
            density: 1.0,
        }
    }
}

/// Resolve a request into render parameters, refusing oversize output.
///
/// Both the logical size and the density-scaled backing buffer must fit
/// under `max_pixels`. Nothing is allocated here.
pub fn plan_render(
    request: &RenderRequest,
    policy: ParsePolicy,
    max_pixels: u64,
) -> Result<RenderParams> {
    let density = validate_density(request.density)?;
    let size = resolve(&request.size, policy)?;
    check_area(size, max_pixels)?;
    check_area(physical_dimensions(size, density), max_pixels)?;

    Ok(RenderParams {
        size,
        mode: request.mode,
        background: request.background,
        density,
    })
}

/// Composite `source` according to `params`.
///
/// Refuses an empty source before touching the backend.
pub fn render(
    backend: &impl ImageBackend,
    source: &SourceRaster,
    params: &RenderParams,
) -> Result<RenderedRaster> {
    if !source.is_ready() {
        return Err(RenderError::SourceNotReady);
    }

    let surface = backend.composite(source.image(), params)?;
    log::debug!(
        "composited {}x{} source into {}x{} ({})",
        source.width(),
        source.height(),
        surface.width(),
        surface.height(),
        params.mode
    );

    Ok(RenderedRaster {
        surface,
        logical: params.size,
        mode: params.mode,
        density: params.density,
    })
}

/// Encode a rendered raster and write it to `path`. Returns the byte count.
pub fn export(
    backend: &impl ImageBackend,
    rendered: &RenderedRaster,
    format: OutputFormat,
    path: &Path,
) -> Result<usize> {
    let bytes = backend.encode(&rendered.surface, format)?;
    std::fs::write(path, &bytes).map_err(BackendError::Io)?;
    Ok(bytes.len())
}

/// Where a file would land in the output, without decoding it.
pub fn preview_placement(
    backend: &impl ImageBackend,
    path: &Path,
    params: &RenderParams,
) -> Result<(Dimensions, Placement)> {
    let dims = backend.identify(path)?;
    if dims.width == 0 || dims.height == 0 {
        return Err(RenderError::SourceNotReady);
    }
    let placement = calculate_placement(
        (dims.width, dims.height),
        (params.size.width, params.size.height),
        params.mode,
    );
    Ok((dims, placement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::resolve::{DEFAULT_MAX_PIXELS, ResolvedDimensions};
    use image::DynamicImage;

    fn request(unit: &str, a: &str, b: &str) -> RenderRequest {
        RenderRequest {
            size: SizeSpec::new(unit, a, b, "300"),
            ..RenderRequest::default()
        }
    }

    #[test]
    fn plan_render_resolves_size() {
        let params =
            plan_render(&request("cm", "21", "29.7"), ParsePolicy::Lenient, DEFAULT_MAX_PIXELS)
                .unwrap();
        assert_eq!(params.size, ResolvedDimensions::new(2480, 3508));
        assert_eq!(params.mode, FitMode::Contain);
        assert_eq!(params.background, Background::WHITE);
    }

    #[test]
    fn plan_render_refuses_oversize() {
        let err = plan_render(
            &request("px", "20000", "20000"),
            ParsePolicy::Lenient,
            DEFAULT_MAX_PIXELS,
        )
        .unwrap_err();
        assert!(err.is_too_large());
    }

    #[test]
    fn plan_render_counts_density_against_ceiling() {
        let mut req = request("px", "8000", "8000");
        assert!(plan_render(&req, ParsePolicy::Lenient, DEFAULT_MAX_PIXELS).is_ok());
        req.density = 2.0;
        let err = plan_render(&req, ParsePolicy::Lenient, DEFAULT_MAX_PIXELS).unwrap_err();
        assert!(err.is_too_large());
    }

    #[test]
    fn plan_render_rejects_density_below_one() {
        let mut req = request("px", "10", "10");
        req.density = 0.5;
        let err = plan_render(&req, ParsePolicy::Lenient, DEFAULT_MAX_PIXELS).unwrap_err();
        assert!(matches!(err, RenderError::Params(ParamsError::InvalidDensity(_))));
    }

    #[test]
    fn plan_render_strict_surfaces_parse_errors() {
        let err =
            plan_render(&request("px", "wide", "10"), ParsePolicy::Strict, DEFAULT_MAX_PIXELS)
                .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Resolve(ResolveError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn render_calls_backend_with_params() {
        let backend = MockBackend::new();
        let source = SourceRaster::new(DynamicImage::new_rgba8(4, 3));
        let params = RenderParams::new(ResolvedDimensions::new(40, 30), FitMode::Cover);

        let rendered = render(&backend, &source, &params).unwrap();
        assert_eq!(rendered.physical_size(), (40, 30));
        assert_eq!(rendered.logical, params.size);
        assert_eq!(rendered.mode, FitMode::Cover);

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Composite {
                source_width: 4,
                source_height: 3,
                width: 40,
                height: 30,
                background: [255, 255, 255, 255],
            }]
        );
    }

    #[test]
    fn render_refuses_empty_source_without_backend_call() {
        let backend = MockBackend::new();
        let source = SourceRaster::new(DynamicImage::new_rgba8(0, 0));
        let params = RenderParams::new(ResolvedDimensions::new(40, 30), FitMode::Contain);

        let err = render(&backend, &source, &params).unwrap_err();
        assert!(matches!(err, RenderError::SourceNotReady));
        assert_eq!(err.to_string(), "Source image not ready");
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn export_writes_encoded_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let source = SourceRaster::new(DynamicImage::new_rgba8(4, 3));
        let params = RenderParams::new(ResolvedDimensions::new(8, 6), FitMode::Contain);
        let rendered = render(&backend, &source, &params).unwrap();

        let path = tmp.path().join("resized.png");
        let written = export(&backend, &rendered, OutputFormat::Png, &path).unwrap();
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"png");
    }

    #[test]
    fn preview_placement_uses_identify_only() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 100,
            height: 200,
        }]);
        let params = RenderParams::new(ResolvedDimensions::new(200, 200), FitMode::Cover);

        let (dims, placement) =
            preview_placement(&backend, Path::new("/photo.jpg"), &params).unwrap();
        assert_eq!((dims.width, dims.height), (100, 200));
        assert_eq!((placement.x, placement.y), (0, -100));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("/photo.jpg".into())]
        );
    }
}
