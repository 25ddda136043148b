//! Image processing in pure Rust: decode, composite, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** | `image::ImageReader` / `image::load_from_memory` |
//! | **Composite** | background fill + Lanczos3 resample + `imageops::overlay` |
//! | **Encode** | PNG, JPEG (quality 0–1) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for fit/placement math (unit testable)
//! - **Parameters**: Data structures describing a render and an export
//! - **Raster**: Source and rendered image value holders
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining resolution + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
mod raster;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{FitMode, Placement, calculate_placement, calculate_scale};
pub use operations::{
    RenderError, RenderRequest, export, plan_render, preview_placement, render,
};
pub use params::{
    Background, JpegQuality, OutputFormat, ParamsError, RenderParams, validate_density,
};
pub use raster::{RenderedRaster, SourceRaster};
pub use rust_backend::RustBackend;
