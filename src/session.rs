//! The working session: one loaded source, one camera stream, one render.
//!
//! All state that the pipeline carries between user actions lives on
//! [`Session`]. Acquisition (file, in-memory bytes, camera frame) replaces the
//! source; [`Session::generate`] replaces the rendered output. Nothing is
//! accumulated.
//!
//! ## Camera lifecycle
//!
//! ```text
//! idle ──open_camera──▶ streaming ──capture──▶ idle (frame loaded as source)
//!                           │
//!                           └──stop_camera / load_* / reset──▶ idle
//! ```
//!
//! A stream is released (all tracks stopped) on every transition back to
//! idle. Capturing without an open stream is refused.

use crate::imaging::{
    BackendError, ImageBackend, OutputFormat, RenderError, RenderRequest, RenderedRaster,
    SourceRaster, plan_render, render,
};
use crate::resolve::{DEFAULT_MAX_PIXELS, ParsePolicy};
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Camera error: {0}")]
    Camera(String),
    #[error("No active camera stream")]
    NoCameraStream,
}

impl From<BackendError> for AcquireError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Io(io) => AcquireError::Io(io),
            BackendError::ProcessingFailed(msg) => AcquireError::Decode(msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Source image not ready")]
    NoSource,
    #[error("Nothing has been rendered yet")]
    NothingRendered,
}

/// A device that can hand out a video stream.
pub trait Camera {
    fn open(&mut self) -> Result<Box<dyn CameraStream>, AcquireError>;
}

/// An open video stream. Owned exclusively by the session that opened it.
pub trait CameraStream {
    /// Grab the current frame.
    fn grab_frame(&mut self) -> Result<DynamicImage, AcquireError>;

    /// Stop every underlying track. Called exactly once, on release.
    fn stop(&mut self);
}

/// Knobs that stay fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub policy: ParsePolicy,
    pub max_pixels: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            policy: ParsePolicy::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

pub struct Session<B: ImageBackend> {
    backend: B,
    settings: SessionSettings,
    source: Option<SourceRaster>,
    rendered: Option<RenderedRaster>,
    stream: Option<Box<dyn CameraStream>>,
}

impl<B: ImageBackend> Session<B> {
    pub fn new(backend: B, settings: SessionSettings) -> Self {
        Self {
            backend,
            settings,
            source: None,
            rendered: None,
            stream: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source(&self) -> Option<&SourceRaster> {
        self.source.as_ref()
    }

    pub fn rendered(&self) -> Option<&RenderedRaster> {
        self.rendered.as_ref()
    }

    pub fn camera_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Install a decoded image as the source, or clear it on failure.
    fn install(
        &mut self,
        decoded: Result<DynamicImage, AcquireError>,
    ) -> Result<&SourceRaster, AcquireError> {
        match decoded {
            Ok(image) => {
                let source = SourceRaster::new(image);
                log::info!("Loaded {}×{}", source.width(), source.height());
                Ok(&*self.source.insert(source))
            }
            Err(e) => {
                self.source = None;
                log::warn!("acquisition failed: {e}");
                Err(e)
            }
        }
    }

    /// Load the source from an image file.
    pub fn load_path(&mut self, path: &Path) -> Result<&SourceRaster, AcquireError> {
        self.release_stream();
        let decoded = self.backend.load(path).map_err(AcquireError::from);
        self.install(decoded)
    }

    /// Load the source from encoded bytes (stdin, clipboard, drops).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&SourceRaster, AcquireError> {
        self.release_stream();
        let decoded = self.backend.decode(bytes).map_err(AcquireError::from);
        self.install(decoded)
    }

    /// Open a camera stream. Returns `false` if one is already open.
    pub fn open_camera(&mut self, camera: &mut dyn Camera) -> Result<bool, AcquireError> {
        if self.stream.is_some() {
            return Ok(false);
        }
        let stream = camera.open()?;
        self.stream = Some(stream);
        log::info!("Camera active");
        Ok(true)
    }

    /// Take one frame from the open stream as the new source, then release
    /// the stream.
    pub fn capture(&mut self) -> Result<&SourceRaster, AcquireError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(AcquireError::NoCameraStream);
        };
        let frame = stream.grab_frame();
        self.release_stream();
        self.install(frame)
    }

    /// Release the camera. Returns `false` if no stream was open.
    pub fn stop_camera(&mut self) -> bool {
        let released = self.release_stream();
        if released {
            log::info!("Camera stopped");
        }
        released
    }

    fn release_stream(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }

    /// Drop the source, the render, and any open stream.
    pub fn reset(&mut self) {
        self.release_stream();
        self.source = None;
        self.rendered = None;
        log::info!("Reset done");
    }

    /// Resolve, check, and composite the current source.
    ///
    /// On refusal the previous render is kept and no new surface is allocated.
    pub fn generate(&mut self, request: &RenderRequest) -> Result<&RenderedRaster, SessionError> {
        let source = self.source.as_ref().ok_or(SessionError::NoSource)?;
        let params = plan_render(request, self.settings.policy, self.settings.max_pixels)?;
        let rendered = render(&self.backend, source, &params)?;
        log::info!(
            "Rendered {}×{}px ({})",
            rendered.logical.width,
            rendered.logical.height,
            rendered.mode
        );
        Ok(&*self.rendered.insert(rendered))
    }

    /// Encode the most recent render.
    pub fn encode_rendered(&self, format: OutputFormat) -> Result<Vec<u8>, SessionError> {
        let rendered = self.rendered.as_ref().ok_or(SessionError::NothingRendered)?;
        let bytes = self
            .backend
            .encode(&rendered.surface, format)
            .map_err(RenderError::from)?;
        Ok(bytes)
    }

    /// Write the most recent render to `path`. Returns the byte count.
    pub fn export(&self, format: OutputFormat, path: &Path) -> Result<usize, SessionError> {
        let rendered = self.rendered.as_ref().ok_or(SessionError::NothingRendered)?;
        Ok(crate::imaging::export(&self.backend, rendered, format, path)?)
    }
}

impl<B: ImageBackend> Drop for Session<B> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
