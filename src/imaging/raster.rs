//! Value holders for the two images a session deals with.
//!
//! A [`SourceRaster`] is what the user loaded; a [`RenderedRaster`] is what
//! the compositor produced from it. Neither is mutated after creation; a new
//! load or render replaces the old value.

use super::calculations::{FitMode, scale_by_density};
use crate::resolve::ResolvedDimensions;
use image::{DynamicImage, GenericImageView, RgbaImage};

/// A decoded input image.
#[derive(Debug, Clone)]
pub struct SourceRaster {
    image: DynamicImage,
}

impl SourceRaster {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// A zero-sized source (failed or pending decode) cannot be rendered.
    pub fn is_ready(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

/// Output of one composite.
///
/// `logical` is the size the user asked for; the pixel buffer is that size
/// multiplied by `density`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRaster {
    pub surface: RgbaImage,
    pub logical: ResolvedDimensions,
    pub mode: FitMode,
    pub density: f64,
}

impl RenderedRaster {
    /// Size of the backing buffer.
    pub fn physical_size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }
}

/// Backing-buffer size for a logical size at `density`.
pub fn physical_dimensions(logical: ResolvedDimensions, density: f64) -> ResolvedDimensions {
    ResolvedDimensions::new(
        scale_by_density(logical.width, density),
        scale_by_density(logical.height, density),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_not_ready() {
        assert!(!SourceRaster::new(DynamicImage::new_rgba8(0, 10)).is_ready());
        assert!(!SourceRaster::new(DynamicImage::new_rgba8(10, 0)).is_ready());
        assert!(SourceRaster::new(DynamicImage::new_rgba8(1, 1)).is_ready());
    }

    #[test]
    fn physical_dimensions_follow_density() {
        let logical = ResolvedDimensions::new(1920, 1080);
        assert_eq!(physical_dimensions(logical, 1.0), logical);
        assert_eq!(
            physical_dimensions(logical, 1.5),
            ResolvedDimensions::new(2880, 1620)
        );
    }
}
